//! HTTP client side of the peer transport.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::peers::protocol::{FetchRequest, WireFormat};
use crate::peers::{PeerGetter, TransportError};

/// Upper bound for the doubling retry backoff.
const MAX_RETRY_BACKOFF: Duration = Duration::from_millis(1200);

/// Knobs shared by every peer client of a pool.
///
/// The defaults block until the peer answers and never retry.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub wire_format: WireFormat,
    /// Per-request timeout covering connect and body; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Extra attempts after a connection-level failure.
    pub retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_backoff: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            wire_format: WireFormat::Raw,
            timeout: None,
            retries: 0,
            retry_backoff: Duration::from_millis(150),
        }
    }
}

/// Fetches values from one remote node at `{base_url}{group}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    base_url: String,
    client: reqwest::Client,
    options: TransportOptions,
}

impl HttpGetter {
    /// `base_url` is the peer address followed by the base path,
    /// e.g. `http://127.0.0.1:8001/vecache/`.
    pub fn new(base_url: impl Into<String>, client: reqwest::Client, options: TransportOptions) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            options,
        }
    }

    fn url_for(&self, request: &FetchRequest) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(&request.group),
            urlencoding::encode(&request.key)
        )
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        let mut delay = self.options.retry_backoff;
        let mut attempt = 0;

        loop {
            let mut request = self.client.get(url);
            if let Some(timeout) = self.options.timeout {
                request = request.timeout(timeout);
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.options.retries => {
                    attempt += 1;
                    warn!(url, attempt, error = %e, "Peer request failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_BACKOFF);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, TransportError> {
        let request = FetchRequest {
            group: group.to_string(),
            key: key.to_string(),
        };
        let url = self.url_for(&request);
        debug!(url, "Fetching from peer");

        let response = self.get_with_retry(&url).await?;
        if response.status() != StatusCode::OK {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        self.options.wire_format.decode(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn getter(base_url: &str) -> HttpGetter {
        HttpGetter::new(base_url, reqwest::Client::new(), TransportOptions::default())
    }

    #[test]
    fn test_url_escapes_group_and_key() {
        let getter = getter("http://127.0.0.1:8001/vecache/");
        let url = getter.url_for(&FetchRequest {
            group: "my group".to_string(),
            key: "a/b?c".to_string(),
        });
        assert_eq!(url, "http://127.0.0.1:8001/vecache/my%20group/a%2Fb%3Fc");
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_request_error() {
        let options = TransportOptions {
            timeout: Some(Duration::from_millis(500)),
            retries: 1,
            retry_backoff: Duration::from_millis(10),
            ..Default::default()
        };
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let getter = HttpGetter::new(format!("http://{addr}/vecache/"), reqwest::Client::new(), options);
        let err = getter.fetch("scores", "Tom").await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }
}
