use crate::request::{CallOptions, NormalizedRequest, Request};
use crate::response::MockResponse;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

/// One intercepted call, as seen by matchers, response functions and
/// history queries.
#[derive(Debug)]
pub struct CallLog {
    /// Normalized URL
    pub url: String,
    /// Decoded query pairs of `url`, in order
    pub query: Vec<(String, String)>,
    pub options: CallOptions,
    /// Present when the caller passed a request object instead of a URL
    pub request: Option<Request>,
    pub signal: Option<CancellationToken>,
    /// Identifier of the matched route, `None` when unmatched
    pub route: Option<String>,
    /// Path parameters bound by `express:` matchers while routing
    pub captured_params: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    response: OnceLock<MockResponse>,
}

impl CallLog {
    /// Build a call record. `parse_body` decodes a JSON body up front.
    pub fn new(normalized: NormalizedRequest, parse_body: bool) -> Self {
        let NormalizedRequest {
            url,
            query,
            mut options,
            request,
            signal,
        } = normalized;
        if parse_body {
            options.parsed_body = options.json_body();
        }
        CallLog {
            url,
            query,
            options,
            request,
            signal,
            route: None,
            captured_params: BTreeMap::new(),
            timestamp: Utc::now(),
            response: OnceLock::new(),
        }
    }

    pub fn method(&self) -> &str {
        &self.options.method
    }

    pub fn is_matched(&self) -> bool {
        self.route.is_some()
    }

    /// Realized response, once resolution has completed.
    pub fn response(&self) -> Option<&MockResponse> {
        self.response.get()
    }

    pub(crate) fn set_response(&self, response: MockResponse) {
        let _ = self.response.set(response);
    }

    /// Rebuild a request object for forwarding to a real client.
    pub fn to_request(&self) -> Request {
        Request {
            url: self.url.clone(),
            method: self.options.method.to_uppercase(),
            headers: self.options.headers.clone(),
            body: self.options.body.clone(),
            signal: self.signal.clone(),
        }
    }
}
