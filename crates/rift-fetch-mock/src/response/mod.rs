//! Response model produced by the mock.
//!
//! # Module Structure
//!
//! - `body` - Buffered and streamed bodies
//! - `builder` - Fluent construction of [`MockResponse`] values

mod body;
mod builder;

pub use body::{Body, BodyStream};
pub use builder::{status_text, ResponseBuilder};

use crate::error::FetchMockError;
use crate::history::PendingSet;
use bytes::Bytes;
use hyper::HeaderMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A realized response.
///
/// Build one with [`ResponseBuilder`] to hand a prebuilt response to a route;
/// it is then returned to the caller as-is.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub(crate) status: u16,
    pub(crate) status_text: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Body,
    pub(crate) url: String,
    pub(crate) redirected: bool,
    /// Registers body reads so `flush(true)` can wait for them.
    pub(crate) tracker: Option<Arc<PendingSet>>,
}

impl MockResponse {
    pub fn builder(status: u16) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn redirected(&self) -> bool {
        self.redirected
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub async fn bytes(&self) -> Result<Bytes, FetchMockError> {
        let _read = self.tracker.as_ref().map(|pending| pending.track_body());
        self.body.read().await
    }

    pub async fn text(&self) -> Result<String, FetchMockError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| FetchMockError::Body(e.to_string()))
    }

    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, FetchMockError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchMockError::Body(e.to_string()))
    }

    pub(crate) fn with_tracker(mut self, tracker: Arc<PendingSet>) -> Self {
        self.tracker = Some(tracker);
        self
    }
}
