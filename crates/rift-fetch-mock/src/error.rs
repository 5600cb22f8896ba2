//! Error types for route registration, dispatch and route file loading.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Error value carried by a route that is declared to throw.
pub type ThrownError = Arc<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering a route or a custom matcher.
///
/// Registration fails before any routing state is touched.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Each route must specify some criteria for matching calls. Use \"*\" to match all calls")]
    MissingMatcher,
    #[error("Each route must define a response")]
    MissingResponse,
    #[error("Adding route with same name or matcher as existing route: {identifier}")]
    DuplicateRoute { identifier: String },
    #[error("Invalid regular expression: {0}")]
    InvalidRegex(#[from] regex::Error),
    #[error("Invalid express path '{path}': {reason}")]
    InvalidExpressPath { path: String, reason: String },
    #[error("Invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Cannot match params without specifying an express: url")]
    ParamsWithoutExpress,
    #[error("No matcher named '{0}' has been defined")]
    UnknownMatcher(String),
    #[error("A matcher named '{0}' is already defined")]
    MatcherAlreadyDefined(String),
}

/// Errors surfaced while dispatching a call.
#[derive(Debug, Error)]
pub enum FetchMockError {
    #[error("No fallback response defined for {method} to {url}")]
    Unmatched { method: String, url: String },
    #[error("Invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid status {0} passed on response object. To respond with a JSON object that has status as a property assign the object to body, e.g. {{\"body\": {{\"status\": \"registered\"}}}}")]
    InvalidStatus(String),
    /// A route declared this error; it reaches the caller unwrapped.
    #[error(transparent)]
    Thrown(ThrownError),
    #[error("The operation was aborted")]
    Aborted,
    #[error("Network request failed: {0}")]
    Network(String),
    #[error("Falling back to the network requires a network client")]
    NetworkUnavailable,
    #[error("Body error: {0}")]
    Body(String),
    #[error("Response task failed: {0}")]
    Task(String),
}

impl FetchMockError {
    /// Whether this error was caused by the call's cancellation signal.
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchMockError::Aborted)
    }
}

/// Error used for `throws` values declared in configuration files or JSON.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DeclaredError(pub String);

/// Errors raised while loading a declarative route file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read route file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML route file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid JSON route file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Route #{index} is invalid: {source}")]
    Route {
        index: usize,
        #[source]
        source: RouteError,
    },
}
