//! Real network clients used when calls fall through to the network.

use crate::error::FetchMockError;
use crate::request::Request;
use crate::response::MockResponse;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A fetch implementation.
///
/// [`crate::FetchMock`] implements this trait as well, so a mock can be
/// injected wherever code expects a real client.
#[async_trait]
pub trait FetchClient: Send + Sync {
    async fn fetch(&self, request: Request) -> Result<MockResponse, FetchMockError>;
}

/// [`FetchClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchMockError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchMockError::Network(e.to_string()))?;
        Ok(ReqwestClient { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestClient { client }
    }

    async fn send(&self, request: Request) -> Result<MockResponse, FetchMockError> {
        let method = reqwest::Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| FetchMockError::Network(e.to_string()))?;
        let mut builder = self
            .client
            .request(method, request.url.as_str())
            .headers(request.headers.clone());
        if let Some(body) = request.body.clone() {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchMockError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let redirected = final_url.trim_end_matches('/') != request.url.trim_end_matches('/');
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchMockError::Network(e.to_string()))?;

        debug!("Network responded {} for {}", status, request.url);
        Ok(MockResponse::builder(status)
            .merge_headers(headers.iter().map(|(name, value)| (name.clone(), value.clone())))
            .body(body)
            .url(final_url)
            .redirected(redirected)
            .build())
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        ReqwestClient::from_client(reqwest::Client::new())
    }
}

#[async_trait]
impl FetchClient for ReqwestClient {
    async fn fetch(&self, request: Request) -> Result<MockResponse, FetchMockError> {
        match request.signal.clone() {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => Err(FetchMockError::Aborted),
                result = self.send(request) => result,
            },
            None => self.send(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_cancelled_request_aborts() {
        let signal = CancellationToken::new();
        signal.cancel();
        let client = ReqwestClient::default();
        let request = Request::new("http://127.0.0.1:9/unreachable").signal(signal);

        let err = client.fetch(request).await.unwrap_err();
        assert!(err.is_abort());
    }

    #[tokio::test]
    async fn test_invalid_method() {
        let client = ReqwestClient::default();
        let request = Request::new("http://127.0.0.1:9/").method("NOT A METHOD");
        let err = client.fetch(request).await.unwrap_err();
        assert!(matches!(err, FetchMockError::Network(_)));
    }
}
