//! reqwest-backed transport

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::registry::{InFlight, RequestHandle, RequestRegistry};
use crate::config::ClientConfig;
use crate::error::{FetchError, ResponseMeta, SetupError};
use crate::observability::Metrics;

/// HTTP transport with handle-based cancellation for downloads
pub struct HttpTransport {
    client: Client,
    base_url: String,
    headers: HeaderMap,
    registry: Arc<RequestRegistry>,
    metrics: Arc<Metrics>,
    runtime: Handle,
}

impl HttpTransport {
    /// Create a transport that spawns onto the current tokio runtime
    pub fn new(config: &ClientConfig) -> Result<Self, SetupError> {
        Self::with_runtime(config, Handle::try_current()?)
    }

    /// Create a transport that spawns onto `runtime`, callable from any thread
    pub fn with_runtime(config: &ClientConfig, runtime: Handle) -> Result<Self, SetupError> {
        Url::parse(&config.base_url).map_err(|e| SetupError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let headers = build_headers(config)?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            headers,
            registry: Arc::new(RequestRegistry::new()),
            metrics: Arc::new(Metrics::new()),
            runtime,
        })
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Number of downloads still tracked (neither completed nor cancelled)
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Base location + `path`, with `query` appended as key/value pairs
    pub fn resolve_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| FetchError::Client(format!("{raw}: {e}")))?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }

        Ok(url)
    }

    /// Typed GET against `path`. Exactly one of the callbacks fires, once.
    ///
    /// A malformed URL fires `on_error` before this returns and sends nothing.
    pub fn perform_request<T, S, E>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        on_success: S,
        on_error: E,
    ) where
        T: DeserializeOwned + Send + 'static,
        S: FnOnce(T) + Send + 'static,
        E: FnOnce(FetchError) + Send + 'static,
    {
        let url = match self.resolve_url(path, query) {
            Ok(url) => url,
            Err(e) => {
                debug!(path, error = %e, "Rejected request URL");
                on_error(e);
                return;
            }
        };

        let request = self.typed_request(url.clone());

        self.runtime.spawn(async move {
            match send_typed::<T>(request, url.as_str()).await {
                Ok(decoded) => on_success(decoded),
                Err(e) => {
                    debug!(url = %url, error = %e, code = e.code(), "Request failed");
                    on_error(e)
                }
            }
        });
    }

    /// Async form of [`perform_request`](Self::perform_request)
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = self.resolve_url(path, query)?;
        send_typed(self.typed_request(url.clone()), url.as_str()).await
    }

    /// Start a binary download of `url`.
    ///
    /// Returns `None` only when `url` is not a usable HTTP URL, after firing
    /// `on_error(FetchError::Client)` synchronously. Otherwise the returned
    /// handle stays cancellable until the download resolves. A cancelled
    /// download fires neither callback.
    pub fn download<S, E>(&self, url: &str, on_success: S, on_error: E) -> Option<RequestHandle>
    where
        S: FnOnce(Bytes) + Send + 'static,
        E: FnOnce(FetchError) + Send + 'static,
    {
        let parsed = match parse_download_url(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(url, error = %e, "Rejected download URL");
                on_error(e);
                return None;
            }
        };

        let handle = RequestHandle::new();
        let token = CancellationToken::new();

        // Registered before spawning so completion always finds its entry
        self.registry.register(handle, InFlight::new(url, token.clone()));
        self.metrics.download_started();

        let request = self.client.get(parsed);
        let registry = Arc::clone(&self.registry);
        let metrics = Arc::clone(&self.metrics);
        let url = url.to_string();

        self.runtime.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = send_download(request, &url) => Some(result),
            };

            let Some(result) = outcome else {
                debug!(%handle, url = %url, "Download aborted");
                return;
            };

            if !registry.complete(handle) {
                debug!(%handle, url = %url, "Download cancelled before delivery");
                return;
            }

            match result {
                Ok(bytes) => {
                    metrics.download_completed();
                    on_success(bytes);
                }
                Err(e) => {
                    metrics.download_failed();
                    debug!(%handle, url = %url, error = %e, code = e.code(), "Download failed");
                    on_error(e);
                }
            }
        });

        Some(handle)
    }

    /// Async download without a handle; dropping the future aborts it
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
        let parsed = parse_download_url(url)?;
        send_download(self.client.get(parsed), url).await
    }

    /// Abort `handle` if it is still tracked. Stale handles are ignored.
    pub fn cancel(&self, handle: RequestHandle) {
        if self.registry.cancel_and_remove(handle) {
            self.metrics.download_cancelled();
        }
    }

    fn typed_request(&self, url: Url) -> RequestBuilder {
        self.client.get(url).headers(self.headers.clone())
    }
}

fn build_headers(config: &ClientConfig) -> Result<HeaderMap, SetupError> {
    let mut headers = HeaderMap::with_capacity(config.headers.len());

    for (name, value) in &config.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| SetupError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| SetupError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

fn parse_download_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::Client(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::Client(format!(
            "unsupported scheme '{other}' in {url}"
        ))),
    }
}

async fn send(request: RequestBuilder) -> Result<Response, FetchError> {
    let response = request.send().await.map_err(|e| {
        if e.is_builder() {
            FetchError::Client(e.to_string())
        } else {
            FetchError::Server(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::UnexpectedResponse(ResponseMeta::new(
            status,
            response.url().as_str(),
        )));
    }

    Ok(response)
}

async fn read_body(response: Response) -> Result<Bytes, FetchError> {
    response
        .bytes()
        .await
        .map_err(|e| FetchError::Server(format!("failed to read body: {e}")))
}

async fn send_typed<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &str,
) -> Result<T, FetchError> {
    debug!(url, "Starting request");

    let body = read_body(send(request).await?).await?;
    if body.is_empty() {
        return Err(FetchError::Decode("empty response body".to_string()));
    }

    let decoded = serde_json::from_slice(&body)?;
    debug!(url, size = body.len(), "Response decoded");

    Ok(decoded)
}

async fn send_download(request: RequestBuilder, url: &str) -> Result<Bytes, FetchError> {
    debug!(url, "Starting download");

    let bytes = read_body(send(request).await?).await?;
    debug!(url, size = bytes.len(), "Download completed");

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn config_with_base(base_url: &str) -> ClientConfig {
        ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let result = HttpTransport::new(&ClientConfig::default());
        assert!(matches!(result, Err(SetupError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn test_rejects_invalid_header() {
        let mut config = ClientConfig::default();
        config
            .headers
            .insert("bad header".to_string(), "value".to_string());

        let result = HttpTransport::new(&config);
        assert!(matches!(result, Err(SetupError::InvalidHeader { name, .. }) if name == "bad header"));
    }

    #[tokio::test]
    async fn test_rejects_invalid_base_url() {
        let result = HttpTransport::new(&config_with_base("::not a url"));
        assert!(matches!(result, Err(SetupError::InvalidBaseUrl { .. })));
    }

    #[tokio::test]
    async fn test_resolve_url_appends_path_and_query() {
        let transport = HttpTransport::new(&config_with_base("https://api.example.com/")).unwrap();

        let url = transport.resolve_url("TFTest/test.json", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/TFTest/test.json");

        let url = transport
            .resolve_url("search", &[("city", "Paris"), ("q", "a b")])
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("city".to_string(), "Paris".to_string())));
        assert!(pairs.contains(&("q".to_string(), "a b".to_string())));
    }

    #[tokio::test]
    async fn test_malformed_request_url_fails_synchronously() {
        let transport = HttpTransport::new(&config_with_base("http://localhost")).unwrap();
        let (tx, rx) = mpsc::channel();
        let err_tx = tx.clone();

        transport.perform_request::<serde_json::Value, _, _>(
            ":99999/listing.json",
            &[],
            move |_| tx.send(Err(())).unwrap(),
            move |e| err_tx.send(Ok(e)).unwrap(),
        );

        let outcome = rx.try_recv().unwrap();
        assert!(matches!(outcome, Ok(FetchError::Client(_))));
    }

    #[tokio::test]
    async fn test_download_rejects_malformed_url_synchronously() {
        let transport = HttpTransport::new(&ClientConfig::default()).unwrap();
        let (tx, rx) = mpsc::channel();

        for bad in ["not a url", "ftp://files.example.com/a.png"] {
            let tx = tx.clone();
            let handle = transport.download(bad, |_| panic!("unexpected success"), move |e| {
                tx.send(e).unwrap()
            });

            assert!(handle.is_none());
            assert!(matches!(rx.try_recv().unwrap(), FetchError::Client(_)));
        }

        assert_eq!(transport.in_flight(), 0);
        assert_eq!(transport.metrics().snapshot().downloads_started, 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_handle_is_noop() {
        let transport = HttpTransport::new(&ClientConfig::default()).unwrap();
        transport.cancel(RequestHandle::new());
        assert_eq!(transport.metrics().snapshot().downloads_cancelled, 0);
    }
}
