use super::{Body, MockResponse};
use hyper::http::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use std::str::FromStr;

/// Canonical reason phrase for a status, empty for 0 and unknown codes.
pub fn status_text(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

pub struct ResponseBuilder {
    status: u16,
    body: Body,
    headers: HeaderMap,
    url: String,
    redirected: bool,
}

impl ResponseBuilder {
    pub fn new(status: u16) -> Self {
        ResponseBuilder {
            status,
            body: Body::Empty,
            headers: Default::default(),
            url: String::new(),
            redirected: false,
        }
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_str(name), HeaderValue::from_str(value))
        {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn append_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_str(name), HeaderValue::from_str(value))
        {
            self.headers.append(name, value);
        }
        self
    }

    pub fn merge_headers<H, K, V>(mut self, headers: H) -> Self
    where
        H: IntoIterator<Item = (K, V)>,
        HeaderName: TryFrom<K>,
        HeaderValue: TryFrom<V>,
    {
        for (key, value) in headers {
            if let (Ok(name), Ok(value)) = (HeaderName::try_from(key), HeaderValue::try_from(value))
            {
                self.headers.append(name, value);
            }
        }
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    pub fn build(self) -> MockResponse {
        MockResponse {
            status: self.status,
            status_text: status_text(self.status),
            headers: self.headers,
            body: self.body,
            url: self.url,
            redirected: self.redirected,
            tracker: None,
        }
    }
}
