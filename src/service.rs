//! Listing and image access for the presentation layer
//!
//! [`DataService`] combines the transport with a [`ResourceCache`]: the
//! listing is always fetched from the network, images are served from the
//! cache when present and downloaded (then cached) otherwise.
//!
//! The service never holds a reference back to its consumer and never runs a
//! callback while holding a lock, so callbacks may call back into it.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::cache::{MemoryCache, ResourceCache};
use crate::config::Config;
use crate::error::{FetchError, SetupError};
use crate::model::ListingEnvelope;
use crate::observability::Metrics;
use crate::transport::{HttpTransport, RequestHandle};

pub struct DataService {
    transport: HttpTransport,
    cache: Arc<dyn ResourceCache>,
    listing_path: String,
}

impl DataService {
    pub fn new(
        transport: HttpTransport,
        cache: Arc<dyn ResourceCache>,
        listing_path: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            cache,
            listing_path: listing_path.into(),
        }
    }

    /// Transport on the current tokio runtime plus a [`MemoryCache`] sized from `config`
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let transport = HttpTransport::new(&config.client)?;
        let cache = Arc::new(MemoryCache::from_config(&config.cache));
        Ok(Self::new(transport, cache, config.client.listing_path.clone()))
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        self.transport.metrics()
    }

    /// Fetch the listing. Outcomes from the transport are passed through as-is.
    pub fn get_listing<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(ListingEnvelope) + Send + 'static,
        E: FnOnce(FetchError) + Send + 'static,
    {
        self.transport.perform_request::<ListingEnvelope, _, _>(
            &self.listing_path,
            &[],
            on_success,
            on_error,
        );
    }

    /// Cache-only lookup; never touches the network
    pub fn cached_image(&self, url: &str) -> Option<Bytes> {
        self.cache.get(url)
    }

    /// Cache-first image fetch.
    ///
    /// On a hit `on_success` runs before this returns and the result is
    /// `None`: there is nothing to cancel. On a miss the image is downloaded,
    /// stored under `url` and only then handed to `on_success`. Failed
    /// downloads are never cached.
    pub fn get_image<S, E>(&self, url: &str, on_success: S, on_error: E) -> Option<RequestHandle>
    where
        S: FnOnce(Bytes) + Send + 'static,
        E: FnOnce(FetchError) + Send + 'static,
    {
        if let Some(bytes) = self.cache.get(url) {
            self.metrics().cache_hit();
            debug!(url, size = bytes.len(), "Image served from cache");
            on_success(bytes);
            return None;
        }

        self.metrics().cache_miss();

        let cache = Arc::clone(&self.cache);
        let key = url.to_string();

        self.transport.download(
            url,
            move |bytes| {
                cache.put(&key, bytes.clone());
                on_success(bytes);
            },
            on_error,
        )
    }

    /// Cancel a download started by [`get_image`](Self::get_image).
    ///
    /// Accepts the `Option` returned by `get_image` directly; `None`, stale
    /// and unknown handles are ignored.
    pub fn cancel(&self, handle: impl Into<Option<RequestHandle>>) {
        if let Some(handle) = handle.into() {
            self.transport.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use std::sync::mpsc;

    fn service_with_cache(cache: Arc<MemoryCache>) -> DataService {
        let transport = HttpTransport::new(&ClientConfig::default()).unwrap();
        DataService::new(transport, cache, "TFTest/test.json")
    }

    #[tokio::test]
    async fn test_cache_hit_is_synchronous_and_returns_no_handle() {
        let cache = Arc::new(MemoryCache::new(8, 1024));
        cache.put("https://img.example.com/a.jpg", Bytes::from_static(b"jpeg"));
        let service = service_with_cache(cache);

        let (tx, rx) = mpsc::channel();
        let handle = service.get_image(
            "https://img.example.com/a.jpg",
            move |bytes| tx.send(bytes).unwrap(),
            |e| panic!("unexpected error: {e}"),
        );

        assert!(handle.is_none());
        assert_eq!(rx.try_recv().unwrap(), Bytes::from_static(b"jpeg"));
        assert_eq!(service.transport().in_flight(), 0);

        let snapshot = service.metrics().snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.downloads_started, 0);
    }

    #[tokio::test]
    async fn test_malformed_image_url_reports_client_error() {
        let cache = Arc::new(MemoryCache::new(8, 1024));
        let service = service_with_cache(Arc::clone(&cache));

        let (tx, rx) = mpsc::channel();
        let handle = service.get_image(
            "definitely not a url",
            |_| panic!("unexpected success"),
            move |e| tx.send(e).unwrap(),
        );

        assert!(handle.is_none());
        assert!(matches!(rx.try_recv().unwrap(), FetchError::Client(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_none_and_unknown_is_noop() {
        let service = service_with_cache(Arc::new(MemoryCache::new(8, 1024)));

        let cache_hit: Option<RequestHandle> = None;
        service.cancel(cache_hit);
        service.cancel(RequestHandle::new());

        assert_eq!(service.metrics().snapshot().downloads_cancelled, 0);
    }

    #[tokio::test]
    async fn test_cached_image_probe() {
        let cache = Arc::new(MemoryCache::new(8, 1024));
        let service = service_with_cache(Arc::clone(&cache));

        assert!(service.cached_image("https://img.example.com/b.jpg").is_none());
        cache.put("https://img.example.com/b.jpg", Bytes::from_static(b"png"));
        assert_eq!(
            service.cached_image("https://img.example.com/b.jpg").unwrap(),
            Bytes::from_static(b"png")
        );
    }
}
