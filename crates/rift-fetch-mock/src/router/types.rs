use crate::predicate::{BodyMatcher, FieldValue, UrlMatcher};
use crate::resolver::ResponseSpec;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

// ============================================================================
// Route Options
// ============================================================================

/// Matching constraints and behavior of a route, beside its URL matcher.
///
/// Also used as the ad hoc filter options of history queries, where only the
/// matching fields apply.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Explicit identifier; defaults to the URL matcher's textual form
    pub name: Option<String>,
    pub method: Option<String>,
    pub headers: Option<BTreeMap<String, FieldValue>>,
    pub query: Option<BTreeMap<String, FieldValue>>,
    /// Expected `express:` parameters
    pub params: Option<BTreeMap<String, String>>,
    pub body: Option<BodyMatcher>,
    /// Values for matchers registered with `define_matcher`, by name
    pub extensions: BTreeMap<String, Value>,

    /// Number of matches after which the route goes inactive
    pub repeat: Option<u32>,
    /// Survives `remove_routes`/`reset` unless sticky routes are included
    pub sticky: bool,
    /// `Some(true)` replaces a clashing route, `Some(false)` adds alongside it
    pub overwrite_routes: Option<bool>,
    pub include_content_length: Option<bool>,
    pub send_as_json: Option<bool>,
    pub match_partial_body: Option<bool>,
    /// Wait before resolving the response
    pub delay: Option<Duration>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: BodyMatcher) -> Self {
        self.body = Some(body);
        self
    }

    pub fn extension(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }

    pub fn repeat(mut self, times: u32) -> Self {
        self.repeat = Some(times);
        self
    }

    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    pub fn overwrite_routes(mut self, overwrite: bool) -> Self {
        self.overwrite_routes = Some(overwrite);
        self
    }

    pub fn include_content_length(mut self, include: bool) -> Self {
        self.include_content_length = Some(include);
        self
    }

    pub fn send_as_json(mut self, send: bool) -> Self {
        self.send_as_json = Some(send);
        self
    }

    pub fn match_partial_body(mut self, partial: bool) -> Self {
        self.match_partial_body = Some(partial);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Whether any structural matching constraint is declared.
    pub fn has_constraints(&self) -> bool {
        self.method.is_some()
            || self.headers.is_some()
            || self.query.is_some()
            || self.params.is_some()
            || self.body.is_some()
            || !self.extensions.is_empty()
    }
}

/// A bare string in the options position is a method.
impl From<&str> for RouteOptions {
    fn from(method: &str) -> Self {
        RouteOptions::new().method(method)
    }
}

impl From<()> for RouteOptions {
    fn from(_: ()) -> Self {
        RouteOptions::default()
    }
}

// ============================================================================
// Route Configuration
// ============================================================================

/// A complete declarative route.
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
    pub url: Option<UrlMatcher>,
    pub response: Option<ResponseSpec>,
    pub options: RouteOptions,
}

impl RouteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<UrlMatcher>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn response(mut self, response: impl Into<ResponseSpec>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }
}

// ============================================================================
// Removal & Inspection
// ============================================================================

/// Which routes `remove_routes` drops.
#[derive(Debug, Clone)]
pub struct RemoveRouteOptions {
    /// Only routes with these identifiers; every route when `None`
    pub names: Option<Vec<String>>,
    pub include_sticky: bool,
    pub include_fallback: bool,
}

impl Default for RemoveRouteOptions {
    fn default() -> Self {
        RemoveRouteOptions {
            names: None,
            include_sticky: false,
            include_fallback: true,
        }
    }
}

impl RemoveRouteOptions {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RemoveRouteOptions {
            names: Some(names.into_iter().map(Into::into).collect()),
            include_fallback: false,
            ..Default::default()
        }
    }

    pub fn include_sticky(mut self) -> Self {
        self.include_sticky = true;
        self
    }

    pub fn keep_fallback(mut self) -> Self {
        self.include_fallback = false;
        self
    }
}

/// Per-route overrides of instance settings, carried into resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOverrides {
    pub include_content_length: Option<bool>,
    pub send_as_json: Option<bool>,
    pub delay: Option<Duration>,
}

/// Read-only view of a registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub identifier: String,
    pub method: Option<String>,
    pub repeat: Option<u32>,
    pub sticky: bool,
    pub match_count: u32,
}
