//! User-defined matchers.
//!
//! A definition names a route option (stored in `RouteOptions::extensions`)
//! and evaluates the option's declared value against each call.

use crate::history::CallLog;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Names already taken by the built-in route options.
pub const RESERVED_MATCHER_NAMES: [&str; 8] = [
    "url", "method", "headers", "query", "params", "body", "name", "response",
];

pub type ExtensionFn = Arc<dyn Fn(&Value, &CallLog) -> bool + Send + Sync>;

/// A custom matcher registered with [`crate::FetchMock::define_matcher`].
///
/// `matcher` runs with the route table locked and must not call back into
/// the mock it is registered on.
#[derive(Clone)]
pub struct MatcherDefinition {
    pub name: String,
    /// Routes using this matcher need the JSON body decoded before matching.
    pub uses_body: bool,
    pub matcher: ExtensionFn,
}

impl MatcherDefinition {
    pub fn new<F>(name: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&Value, &CallLog) -> bool + Send + Sync + 'static,
    {
        MatcherDefinition {
            name: name.into(),
            uses_body: false,
            matcher: Arc::new(matcher),
        }
    }

    pub fn uses_body(mut self) -> Self {
        self.uses_body = true;
        self
    }
}

impl fmt::Debug for MatcherDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherDefinition")
            .field("name", &self.name)
            .field("uses_body", &self.uses_body)
            .finish()
    }
}
