//! Response resolution.
//!
//! `Unresolved` specs (functions, futures) are driven until a terminal value
//! remains. A throws marker then fails the call, a prebuilt response is
//! returned verbatim, and anything else is synthesized from a config.

use super::spec::{classify_json, ConfigBody, ResponseConfig, ResponseSpec};
use crate::error::FetchMockError;
use crate::history::CallLog;
use crate::response::{Body, MockResponse, ResponseBuilder};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::debug;

/// Settings that shape synthesized responses, after route overrides.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    pub include_content_length: bool,
    pub send_as_json: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            include_content_length: true,
            send_as_json: true,
        }
    }
}

/// Resolve a declared response for one call.
pub async fn resolve_response(
    spec: ResponseSpec,
    call: &CallLog,
    options: ResolveOptions,
) -> Result<MockResponse, FetchMockError> {
    let mut spec = spec;
    let config = loop {
        spec = match spec {
            ResponseSpec::Function(f) => f(call),
            ResponseSpec::Future(future) => future.await,
            ResponseSpec::Throws(error) => return Err(FetchMockError::Thrown(error)),
            ResponseSpec::Response(response) => return Ok(response),
            ResponseSpec::Status(status) => break ResponseConfig::new().status(status),
            ResponseSpec::Text(text) => break ResponseConfig::new().body(text),
            ResponseSpec::Bytes(bytes) => break ResponseConfig::new().body(bytes),
            ResponseSpec::Json(value) => break classify_json(value, options.send_as_json)?,
            ResponseSpec::Config(config) => break config,
        };
    };
    if let Some(error) = config.throws {
        return Err(FetchMockError::Thrown(error));
    }
    synthesize(config, call, options)
}

/// Accept 0 or a status in the HTTP range.
pub fn validate_status(status: i64) -> Result<u16, FetchMockError> {
    if status == 0 || (100..=599).contains(&status) {
        // range checked above
        Ok(status as u16)
    } else {
        Err(FetchMockError::InvalidStatus(status.to_string()))
    }
}

fn synthesize(
    config: ResponseConfig,
    call: &CallLog,
    options: ResolveOptions,
) -> Result<MockResponse, FetchMockError> {
    let status = validate_status(config.status.unwrap_or(200))?;
    let mut builder = ResponseBuilder::new(status);
    for (name, value) in &config.headers {
        builder = builder.append_header(name, value);
    }

    let has_content_type = config.has_header(CONTENT_TYPE.as_str());
    let has_content_length = config.has_header(CONTENT_LENGTH.as_str());

    let body = match config.body {
        None => None,
        Some(ConfigBody::Text(text)) => Some(Body::from(text)),
        Some(ConfigBody::Bytes(bytes)) => Some(Body::from(bytes)),
        Some(ConfigBody::Json(value)) => {
            if options.send_as_json && !has_content_type {
                builder = builder.header(CONTENT_TYPE.as_str(), "application/json");
            }
            let encoded =
                serde_json::to_vec(&value).map_err(|e| FetchMockError::Body(e.to_string()))?;
            Some(Body::from(encoded))
        }
        Some(ConfigBody::Stream(body)) => Some(body),
    };

    if options.include_content_length && !has_content_length {
        if let Some(length) = body.as_ref().and_then(Body::len) {
            builder = builder.header(CONTENT_LENGTH.as_str(), &length.to_string());
        }
    }

    let builder = match &config.redirect_url {
        Some(target) => builder.url(target.as_str()).redirected(true),
        None => builder.url(call.url.as_str()),
    };
    let builder = match body {
        Some(body) => builder.body(body),
        None => builder,
    };

    debug!("Synthesized {} response for {}", status, call.url);
    Ok(builder.build())
}
