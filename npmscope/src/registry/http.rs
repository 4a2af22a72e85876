//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Default User-Agent sent to the registry.
const DEFAULT_USER_AGENT: &str = concat!("npmscope/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Errors produced by an [`AsyncHttpClient`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request never produced a response (DNS, connect, TLS, timeout...).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl HttpError {
    /// Returns the HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// Trait for asynchronous HTTP GET operations.
///
/// The registry client only ever reads, so this is the whole surface.
/// Implementations must report non-2xx answers as [`HttpError::Status`] so
/// callers can tell a missing package from a broken network.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Performs an async HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| HttpError::Transport {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        trace!(url = url, "HTTP GET request starting");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                HttpError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        debug!(url = url, status = status.as_u16(), "HTTP response received");

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| HttpError::Transport {
                url: url.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Mock async HTTP client for testing.
    ///
    /// Serves canned bodies by exact URL and answers 404 for anything else.
    /// Every request is recorded so tests can assert on fetch counts.
    #[derive(Clone, Default)]
    pub struct MockAsyncHttpClient {
        responses: Arc<Mutex<HashMap<String, Result<Vec<u8>, HttpError>>>>,
        calls: Arc<Mutex<Vec<String>>>,
        latency: Option<Duration>,
    }

    impl MockAsyncHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        pub fn respond(&self, url: &str, body: impl Into<Vec<u8>>) {
            self.responses
                .lock()
                .insert(url.to_string(), Ok(body.into()));
        }

        pub fn fail(&self, url: &str, error: HttpError) {
            self.responses.lock().insert(url.to_string(), Err(error));
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.calls.lock().iter().filter(|u| *u == url).count()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            self.calls.lock().push(url.to_string());
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            let canned = self.responses.lock().get(url).cloned();
            canned.unwrap_or_else(|| {
                Err(HttpError::Status {
                    status: 404,
                    url: url.to_string(),
                })
            })
        }
    }

    #[tokio::test]
    async fn test_mock_async_client_success() {
        let mock = MockAsyncHttpClient::new();
        mock.respond("http://example.com", vec![1, 2, 3]);

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.call_count("http://example.com"), 1);
    }

    #[tokio::test]
    async fn test_mock_async_client_unknown_url_is_404() {
        let mock = MockAsyncHttpClient::new();

        let err = mock.get("http://example.com/missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_http_error_display() {
        let err = HttpError::Status {
            status: 500,
            url: "http://x".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500 from http://x");

        let err = HttpError::Transport {
            url: "http://x".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("connection refused"));
    }
}
