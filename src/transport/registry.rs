//! In-flight download tracking
//!
//! The registry entry for a handle is the single arbiter between
//! cancellation and completion: whichever side removes it first owns the
//! outcome. The other side finds nothing and does nothing.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Opaque token for one in-flight download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle(Uuid);

impl RequestHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Cancellable operation owned by the registry.
#[derive(Debug)]
pub struct InFlight {
    url: String,
    token: CancellationToken,
}

impl InFlight {
    pub fn new(url: impl Into<String>, token: CancellationToken) -> Self {
        Self {
            url: url.into(),
            token,
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestRegistry {
    inflight: Mutex<HashMap<RequestHandle, InFlight>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an operation. Must happen before the operation can complete.
    pub fn register(&self, handle: RequestHandle, operation: InFlight) {
        self.inflight.lock().insert(handle, operation);
    }

    /// Abort and forget `handle`. Unknown or already-resolved handles are a no-op.
    ///
    /// Returns `true` when this call won against completion.
    pub fn cancel_and_remove(&self, handle: RequestHandle) -> bool {
        let removed = self.inflight.lock().remove(&handle);
        match removed {
            Some(operation) => {
                operation.token.cancel();
                debug!(%handle, url = %operation.url, "Cancelled in-flight download");
                true
            }
            None => false,
        }
    }

    /// Mark `handle` as finished. Returns `false` if it was cancelled first,
    /// in which case the outcome must not be delivered.
    pub fn complete(&self, handle: RequestHandle) -> bool {
        self.inflight.lock().remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tracked(registry: &RequestRegistry) -> (RequestHandle, CancellationToken) {
        let handle = RequestHandle::new();
        let token = CancellationToken::new();
        registry.register(handle, InFlight::new("https://x/img.png", token.clone()));
        (handle, token)
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(RequestHandle::new(), RequestHandle::new());
    }

    #[test]
    fn test_cancel_fires_token_and_removes() {
        let registry = RequestRegistry::new();
        let (handle, token) = tracked(&registry);

        assert!(registry.cancel_and_remove(handle));
        assert!(token.is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancel_twice_is_noop() {
        let registry = RequestRegistry::new();
        let (handle, _token) = tracked(&registry);

        assert!(registry.cancel_and_remove(handle));
        assert!(!registry.cancel_and_remove(handle));
        assert!(!registry.cancel_and_remove(RequestHandle::new()));
    }

    #[test]
    fn test_cancel_after_complete_has_no_effect() {
        let registry = RequestRegistry::new();
        let (handle, token) = tracked(&registry);

        assert!(registry.complete(handle));
        assert!(!registry.cancel_and_remove(handle));
        assert!(!token.is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_complete_after_cancel_suppresses_delivery() {
        let registry = RequestRegistry::new();
        let (handle, _token) = tracked(&registry);

        registry.cancel_and_remove(handle);
        assert!(!registry.complete(handle));
    }

    #[test]
    fn test_racing_cancel_and_complete_single_winner() {
        for _ in 0..200 {
            let registry = Arc::new(RequestRegistry::new());
            let (handle, _token) = tracked(&registry);
            let winners = Arc::new(AtomicUsize::new(0));

            let cancel = {
                let registry = Arc::clone(&registry);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if registry.cancel_and_remove(handle) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            };
            let complete = {
                let registry = Arc::clone(&registry);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if registry.complete(handle) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            };

            cancel.join().unwrap();
            complete.join().unwrap();
            assert_eq!(winners.load(Ordering::SeqCst), 1);
        }
    }
}
