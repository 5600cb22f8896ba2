//! Configuration types for the fetch mock.

mod routes;

use crate::network::FetchClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use routes::{RouteDefinition, RouteFile};

/// When calls are forwarded to the real network client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackMode {
    /// Unmatched calls without a fallback response fail
    #[default]
    Never,
    /// Unmatched calls without a fallback response are forwarded
    Unmatched,
    /// Every call is forwarded, bypassing the routes
    Always,
}

/// Instance-wide settings. Routes may override the response-shaping ones.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchMockConfig {
    /// Add `content-length` to synthesized responses
    pub include_content_length: bool,
    /// Treat object response values as JSON bodies
    pub send_as_json: bool,
    /// Warn when a call is answered by the fallback or fails unmatched
    pub warn_on_fallback: bool,
    /// Body matchers accept JSON bodies that contain the declared value
    pub match_partial_body: bool,
    /// `None` rejects duplicate routes, `Some(true)` replaces, `Some(false)` appends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_routes: Option<bool>,
    pub fallback_to_network: FallbackMode,
    /// Real client used when forwarding to the network
    #[serde(skip)]
    pub network: Option<Arc<dyn FetchClient>>,
}

impl Default for FetchMockConfig {
    fn default() -> Self {
        FetchMockConfig {
            include_content_length: true,
            send_as_json: true,
            warn_on_fallback: true,
            match_partial_body: false,
            overwrite_routes: None,
            fallback_to_network: FallbackMode::Never,
            network: None,
        }
    }
}

impl FetchMockConfig {
    pub fn with_network(mut self, mode: FallbackMode, client: Arc<dyn FetchClient>) -> Self {
        self.fallback_to_network = mode;
        self.network = Some(client);
        self
    }

    /// Apply the settings declared in a route file on top of these.
    pub fn merge_file_settings(&mut self, other: &FetchMockConfig) {
        self.include_content_length = other.include_content_length;
        self.send_as_json = other.send_as_json;
        self.warn_on_fallback = other.warn_on_fallback;
        self.match_partial_body = other.match_partial_body;
        self.overwrite_routes = other.overwrite_routes.or(self.overwrite_routes);
        self.fallback_to_network = other.fallback_to_network;
    }
}

impl fmt::Debug for FetchMockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchMockConfig")
            .field("include_content_length", &self.include_content_length)
            .field("send_as_json", &self.send_as_json)
            .field("warn_on_fallback", &self.warn_on_fallback)
            .field("match_partial_body", &self.match_partial_body)
            .field("overwrite_routes", &self.overwrite_routes)
            .field("fallback_to_network", &self.fallback_to_network)
            .field("network", &self.network.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FetchMockConfig::default();
        assert!(config.include_content_length);
        assert!(config.send_as_json);
        assert!(config.warn_on_fallback);
        assert!(!config.match_partial_body);
        assert_eq!(config.overwrite_routes, None);
        assert_eq!(config.fallback_to_network, FallbackMode::Never);
        assert!(config.network.is_none());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
sendAsJson: false
matchPartialBody: true
overwriteRoutes: false
fallbackToNetwork: unmatched
"#;
        let config: FetchMockConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.send_as_json);
        assert!(config.match_partial_body);
        assert!(config.include_content_length);
        assert_eq!(config.overwrite_routes, Some(false));
        assert_eq!(config.fallback_to_network, FallbackMode::Unmatched);
    }

    #[test]
    fn test_merge_keeps_existing_overwrite() {
        let mut config = FetchMockConfig {
            overwrite_routes: Some(true),
            ..Default::default()
        };
        let file = FetchMockConfig {
            warn_on_fallback: false,
            ..Default::default()
        };
        config.merge_file_settings(&file);
        assert_eq!(config.overwrite_routes, Some(true));
        assert!(!config.warn_on_fallback);
    }
}
