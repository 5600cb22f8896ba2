//! Declared response values.

use crate::error::{DeclaredError, FetchMockError, ThrownError};
use crate::history::CallLog;
use crate::response::{Body, MockResponse};
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Keys of a JSON object that make it a response config rather than a body.
pub const CONFIG_KEYS: [&str; 5] = ["body", "headers", "status", "throws", "redirectUrl"];

pub type ResponseFn = Arc<dyn Fn(&CallLog) -> ResponseSpec + Send + Sync>;
pub type SpecFuture = Shared<BoxFuture<'static, ResponseSpec>>;

/// How a route answers a matched call.
///
/// Functions and futures are resolved repeatedly until a terminal value
/// remains; only then are `Throws` and prebuilt responses recognized.
#[derive(Clone)]
pub enum ResponseSpec {
    /// Bare status code with an empty body
    Status(i64),
    Text(String),
    Bytes(Bytes),
    /// A JSON value: numbers are statuses, strings are text bodies, objects
    /// are either a response config or a JSON body (see [`CONFIG_KEYS`])
    Json(Value),
    Config(ResponseConfig),
    /// Returned to the caller as-is
    Response(MockResponse),
    Function(ResponseFn),
    Future(SpecFuture),
    Throws(ThrownError),
}

impl ResponseSpec {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&CallLog) -> ResponseSpec + Send + Sync + 'static,
    {
        ResponseSpec::Function(Arc::new(f))
    }

    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = ResponseSpec> + Send + 'static,
    {
        ResponseSpec::Future(future.boxed().shared())
    }

    pub fn throws<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ResponseSpec::Throws(Arc::new(error))
    }

    /// Answer with `spec` after waiting `duration`, on every call.
    pub fn delay(duration: Duration, spec: impl Into<ResponseSpec>) -> Self {
        let spec = spec.into();
        ResponseSpec::from_fn(move |_| {
            let spec = spec.clone();
            ResponseSpec::from_future(async move {
                tokio::time::sleep(duration).await;
                spec
            })
        })
    }
}

impl fmt::Debug for ResponseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSpec::Status(s) => f.debug_tuple("Status").field(s).finish(),
            ResponseSpec::Text(t) => f.debug_tuple("Text").field(t).finish(),
            ResponseSpec::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            ResponseSpec::Json(v) => f.debug_tuple("Json").field(v).finish(),
            ResponseSpec::Config(c) => f.debug_tuple("Config").field(c).finish(),
            ResponseSpec::Response(r) => f.debug_tuple("Response").field(&r.status()).finish(),
            ResponseSpec::Function(_) => f.write_str("Function(..)"),
            ResponseSpec::Future(_) => f.write_str("Future(..)"),
            ResponseSpec::Throws(e) => f.debug_tuple("Throws").field(&e.to_string()).finish(),
        }
    }
}

impl From<u16> for ResponseSpec {
    fn from(status: u16) -> Self {
        ResponseSpec::Status(status.into())
    }
}

impl From<i32> for ResponseSpec {
    fn from(status: i32) -> Self {
        ResponseSpec::Status(status.into())
    }
}

impl From<i64> for ResponseSpec {
    fn from(status: i64) -> Self {
        ResponseSpec::Status(status)
    }
}

impl From<&str> for ResponseSpec {
    fn from(text: &str) -> Self {
        ResponseSpec::Text(text.to_string())
    }
}

impl From<String> for ResponseSpec {
    fn from(text: String) -> Self {
        ResponseSpec::Text(text)
    }
}

impl From<Bytes> for ResponseSpec {
    fn from(bytes: Bytes) -> Self {
        ResponseSpec::Bytes(bytes)
    }
}

impl From<Value> for ResponseSpec {
    fn from(value: Value) -> Self {
        ResponseSpec::Json(value)
    }
}

impl From<ResponseConfig> for ResponseSpec {
    fn from(config: ResponseConfig) -> Self {
        ResponseSpec::Config(config)
    }
}

impl From<MockResponse> for ResponseSpec {
    fn from(response: MockResponse) -> Self {
        ResponseSpec::Response(response)
    }
}

/// Body declared on a response config.
#[derive(Debug, Clone)]
pub enum ConfigBody {
    Text(String),
    Bytes(Bytes),
    /// Serialized as JSON; tagged `application/json` while JSON sending is on
    Json(Value),
    Stream(Body),
}

impl ConfigBody {
    /// Interpret a JSON value as a body. `null` means no body.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(ConfigBody::Text(text)),
            Value::Object(_) | Value::Array(_) => Some(ConfigBody::Json(value)),
            other => Some(ConfigBody::Text(other.to_string())),
        }
    }
}

impl From<&str> for ConfigBody {
    fn from(text: &str) -> Self {
        ConfigBody::Text(text.to_string())
    }
}

impl From<String> for ConfigBody {
    fn from(text: String) -> Self {
        ConfigBody::Text(text)
    }
}

impl From<Bytes> for ConfigBody {
    fn from(bytes: Bytes) -> Self {
        ConfigBody::Bytes(bytes)
    }
}

impl From<Value> for ConfigBody {
    fn from(value: Value) -> Self {
        ConfigBody::Json(value)
    }
}

impl From<Body> for ConfigBody {
    fn from(body: Body) -> Self {
        ConfigBody::Stream(body)
    }
}

/// Structured description of a response to synthesize.
#[derive(Clone, Default)]
pub struct ResponseConfig {
    /// Defaults to 200. 0 is a distinct, legal status.
    pub status: Option<i64>,
    pub body: Option<ConfigBody>,
    pub headers: Vec<(String, String)>,
    /// Marks the response redirected and sets its final URL
    pub redirect_url: Option<String>,
    pub throws: Option<ThrownError>,
}

impl ResponseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: i64) -> Self {
        self.status = Some(status);
        self
    }

    pub fn body(mut self, body: impl Into<ConfigBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    pub fn throws<E>(mut self, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.throws = Some(Arc::new(error));
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Read a config from the recognized keys of a JSON object.
    pub fn from_json_object(map: Map<String, Value>) -> Result<Self, FetchMockError> {
        let mut config = ResponseConfig::new();
        for (key, value) in map {
            match key.as_str() {
                "status" => {
                    let status = value
                        .as_i64()
                        .ok_or_else(|| FetchMockError::InvalidStatus(value.to_string()))?;
                    config.status = Some(status);
                }
                "body" => config.body = ConfigBody::from_value(value),
                "headers" => {
                    if let Value::Object(headers) = value {
                        for (name, value) in headers {
                            match value {
                                Value::Array(values) => {
                                    for v in values {
                                        config.headers.push((name.clone(), scalar_text(v)));
                                    }
                                }
                                other => config.headers.push((name, scalar_text(other))),
                            }
                        }
                    }
                }
                "redirectUrl" => config.redirect_url = value.as_str().map(str::to_string),
                "throws" => {
                    config.throws = Some(Arc::new(DeclaredError(scalar_text(value))));
                }
                _ => {}
            }
        }
        Ok(config)
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl fmt::Debug for ResponseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseConfig")
            .field("status", &self.status)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("redirect_url", &self.redirect_url)
            .field("throws", &self.throws.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

/// Classify a JSON value into a response config.
///
/// An object is a config only when it has a config key and nothing else;
/// otherwise the whole object is the JSON body. With `send_as_json` off
/// every object is read as a config.
pub fn classify_json(value: Value, send_as_json: bool) -> Result<ResponseConfig, FetchMockError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|status| ResponseConfig::new().status(status))
            .ok_or_else(|| FetchMockError::InvalidStatus(n.to_string())),
        Value::Object(map) => {
            let is_config_key = |k: &String| CONFIG_KEYS.contains(&k.as_str());
            let has_config_key = map.keys().any(is_config_key);
            let has_other_key = map.keys().any(|k| !is_config_key(k));
            if send_as_json && (!has_config_key || has_other_key) {
                Ok(ResponseConfig::new().body(ConfigBody::Json(Value::Object(map))))
            } else {
                ResponseConfig::from_json_object(map)
            }
        }
        other => {
            let mut config = ResponseConfig::new();
            config.body = ConfigBody::from_value(other);
            Ok(config)
        }
    }
}
