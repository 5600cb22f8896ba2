//! Declarative route files (YAML or JSON).
//!
//! ```yaml
//! config:
//!   matchPartialBody: true
//! routes:
//!   - name: users
//!     url: "express:/users/:id"
//!     method: GET
//!     response: { status: 200, body: { id: 1 } }
//!   - url: "begin:http://api.example.com"
//!     repeat: 2
//!     response: 204
//! fallback: 404
//! ```

use super::FetchMockConfig;
use crate::error::{ConfigError, RouteError};
use crate::predicate::{BodyMatcher, FieldValue, UrlMatcher};
use crate::resolver::ResponseSpec;
use crate::router::{RouteConfig, RouteOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// One route as written in a route file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Matcher string, with or without a dialect prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Regular expression matcher; takes precedence over `url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, FieldValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, FieldValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
    /// Expected JSON request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u32>,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite_routes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_content_length: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_as_json: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_partial_body: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl RouteDefinition {
    /// Convert to a route config. Missing matcher or response is left for
    /// registration to report.
    pub fn to_route_config(&self) -> Result<RouteConfig, RouteError> {
        let url = match (&self.regex, &self.url) {
            (Some(pattern), _) => Some(UrlMatcher::regex(pattern)?),
            (None, Some(url)) => Some(UrlMatcher::parse(url)),
            (None, None) => None,
        };

        let options = RouteOptions {
            name: self.name.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            query: self.query.clone(),
            params: self.params.clone(),
            body: self.body.clone().map(BodyMatcher::json),
            repeat: self.repeat,
            sticky: self.sticky,
            overwrite_routes: self.overwrite_routes,
            include_content_length: self.include_content_length,
            send_as_json: self.send_as_json,
            match_partial_body: self.match_partial_body,
            delay: self.delay_ms.map(Duration::from_millis),
            ..Default::default()
        };

        Ok(RouteConfig {
            url,
            response: self.response.clone().map(ResponseSpec::from),
            options,
        })
    }
}

/// A route file: optional instance settings, routes and a fallback.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<FetchMockConfig>,
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
    /// Response used when no route matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Value>,
}

impl RouteFile {
    /// Load a route file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file = if is_json {
            Self::from_json_str(&contents)?
        } else {
            Self::from_yaml_str(&contents)?
        };

        info!(
            "Loaded {} routes from {}",
            file.routes.len(),
            path.display()
        );
        Ok(file)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Convert every route definition, reporting the first invalid one.
    pub fn route_configs(&self) -> Result<Vec<RouteConfig>, ConfigError> {
        self.routes
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                definition
                    .to_route_config()
                    .map_err(|source| ConfigError::Route { index, source })
            })
            .collect()
    }

    pub fn fallback_response(&self) -> Option<ResponseSpec> {
        self.fallback.clone().map(ResponseSpec::from)
    }
}
