use super::url::{get_query, normalize_url, parse_query};
use bytes::Bytes;
use hyper::http::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (HeaderName::from_str(name), HeaderValue::from_str(value)) {
        headers.append(name, value);
    }
}

/// A request object handed to [`crate::FetchMock::fetch`] instead of a bare URL.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub method: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub signal: Option<CancellationToken>,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Request {
            url: url.into(),
            method: "GET".to_string(),
            headers: HeaderMap::new(),
            body: None,
            signal: None,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Append a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Options accompanying a bare URL, mirroring a fetch `init` object.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub signal: Option<CancellationToken>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.headers, name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// First argument of a fetch call: a URL or a request object.
#[derive(Debug, Clone)]
pub enum FetchInput {
    Url(String),
    Request(Request),
}

impl FetchInput {
    /// The URL as the caller wrote it.
    pub fn url(&self) -> &str {
        match self {
            FetchInput::Url(url) => url,
            FetchInput::Request(request) => &request.url,
        }
    }
}

impl From<&str> for FetchInput {
    fn from(url: &str) -> Self {
        FetchInput::Url(url.to_string())
    }
}

impl From<String> for FetchInput {
    fn from(url: String) -> Self {
        FetchInput::Url(url)
    }
}

impl From<&String> for FetchInput {
    fn from(url: &String) -> Self {
        FetchInput::Url(url.clone())
    }
}

impl From<url::Url> for FetchInput {
    fn from(url: url::Url) -> Self {
        FetchInput::Url(url.to_string())
    }
}

impl From<Request> for FetchInput {
    fn from(request: Request) -> Self {
        FetchInput::Request(request)
    }
}

/// Request options after normalization.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Lower-cased method, `get` when the caller gave none.
    pub method: String,
    /// Header names are lower-case by construction.
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// JSON body, decoded up front when some route matches on bodies.
    pub parsed_body: Option<serde_json::Value>,
}

impl CallOptions {
    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decoded JSON body, parsing on demand when it was not decoded up front.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        if let Some(parsed) = &self.parsed_body {
            return Some(parsed.clone());
        }
        self.body
            .as_ref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }
}

/// A dispatched call, normalized and ready for matching.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub options: CallOptions,
    pub request: Option<Request>,
    pub signal: Option<CancellationToken>,
}

/// Normalize a fetch call's `(input, init)` pair.
///
/// When a request object is given, `init` fields that are set take
/// precedence over the request's own.
pub fn normalize_request(
    input: FetchInput,
    init: Option<RequestInit>,
) -> Result<NormalizedRequest, url::ParseError> {
    let init = init.unwrap_or_default();
    let (raw_url, method, headers, body, signal, request) = match input {
        FetchInput::Url(url) => (url, init.method, init.headers, init.body, init.signal, None),
        FetchInput::Request(request) => {
            let mut headers = request.headers.clone();
            for (name, value) in init.headers.iter() {
                headers.insert(name.clone(), value.clone());
            }
            (
                request.url.clone(),
                init.method.or_else(|| Some(request.method.clone())),
                headers,
                init.body.or_else(|| request.body.clone()),
                init.signal.or_else(|| request.signal.clone()),
                Some(request),
            )
        }
    };

    let url = normalize_url(&raw_url)?;
    let query = parse_query(&get_query(&url));
    let method = method
        .map(|m| m.to_lowercase())
        .unwrap_or_else(|| "get".to_string());

    Ok(NormalizedRequest {
        url,
        query,
        options: CallOptions {
            method,
            headers,
            body,
            parsed_body: None,
        },
        request,
        signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_url_defaults_to_get() {
        let normalized = normalize_request("http://a.com/x?y=1".into(), None).unwrap();
        assert_eq!(normalized.url, "http://a.com/x?y=1");
        assert_eq!(normalized.options.method, "get");
        assert_eq!(normalized.query, vec![("y".to_string(), "1".to_string())]);
        assert!(normalized.request.is_none());
    }

    #[test]
    fn test_init_method_is_lowercased() {
        let init = RequestInit::new().method("POST").header("X-Token", "abc");
        let normalized = normalize_request("/x".into(), Some(init)).unwrap();
        assert_eq!(normalized.options.method, "post");
        assert_eq!(normalized.options.header("x-token"), Some("abc"));
    }

    #[test]
    fn test_request_object_is_kept() {
        let request = Request::new("http://a.com/")
            .method("PUT")
            .header("Accept", "text/plain")
            .body("payload");
        let normalized = normalize_request(request.into(), None).unwrap();
        assert_eq!(normalized.options.method, "put");
        assert_eq!(normalized.options.header("accept"), Some("text/plain"));
        assert_eq!(normalized.options.body.as_deref(), Some(&b"payload"[..]));
        assert_eq!(normalized.request.unwrap().url, "http://a.com/");
    }

    #[test]
    fn test_init_overrides_request_fields() {
        let request = Request::new("/x").method("GET").header("a", "1");
        let init = RequestInit::new().method("DELETE").header("a", "2");
        let normalized = normalize_request(request.into(), Some(init)).unwrap();
        assert_eq!(normalized.options.method, "delete");
        assert_eq!(normalized.options.header("a"), Some("2"));
    }

    #[test]
    fn test_init_headers_merge_into_request_headers() {
        let request = Request::new("/x").header("a", "1").header("b", "kept");
        let init = RequestInit::new().header("a", "2");
        let normalized = normalize_request(request.into(), Some(init)).unwrap();
        assert_eq!(normalized.options.header("a"), Some("2"));
        assert_eq!(normalized.options.header("b"), Some("kept"));

        let init = RequestInit::new().header("c", "3");
        let normalized = normalize_request("/x".into(), Some(init)).unwrap();
        assert_eq!(normalized.options.header("c"), Some("3"));
        assert!(normalized.request.is_none());
    }

    #[test]
    fn test_json_body_parses_on_demand() {
        let init = RequestInit::new()
            .method("post")
            .json(&serde_json::json!({"a": 1}));
        let normalized = normalize_request("/x".into(), Some(init)).unwrap();
        assert_eq!(
            normalized.options.json_body(),
            Some(serde_json::json!({"a": 1}))
        );
    }
}
