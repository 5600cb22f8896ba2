//! The ordered route table.

use super::types::{RemoveRouteOptions, RouteConfig, RouteOverrides, RouteSummary};
use crate::config::FetchMockConfig;
use crate::error::RouteError;
use crate::history::CallLog;
use crate::predicate::{
    CompiledRouteMatcher, MatcherDefinition, UrlMatcher, RESERVED_MATCHER_NAMES,
};
use crate::resolver::ResponseSpec;
use std::collections::BTreeMap;
use tracing::debug;

/// Identifier of routes without a URL matcher.
pub const WILDCARD_IDENTIFIER: &str = "*";

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route {
    pub identifier: String,
    pub response: ResponseSpec,
    pub repeat: Option<u32>,
    pub sticky: bool,
    pub overrides: RouteOverrides,
    matcher: CompiledRouteMatcher,
    match_count: u32,
}

impl Route {
    /// Lower-cased method constraint, if any.
    pub fn method(&self) -> Option<&str> {
        self.matcher.method()
    }

    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    /// A route stays registered after its repeat limit is reached, but no
    /// longer takes part in matching or duplicate detection.
    pub fn is_exhausted(&self) -> bool {
        self.repeat.is_some_and(|limit| self.match_count >= limit)
    }

    pub fn uses_body(&self) -> bool {
        self.matcher.uses_body()
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            identifier: self.identifier.clone(),
            method: self.method().map(str::to_string),
            repeat: self.repeat,
            sticky: self.sticky,
            match_count: self.match_count,
        }
    }

    fn clashes_with(&self, identifier: &str, method: Option<&str>) -> bool {
        if self.is_exhausted() || self.identifier != identifier {
            return false;
        }
        match (self.method(), method) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// Result of routing one call.
#[derive(Debug)]
pub enum RouteOutcome {
    Matched {
        identifier: String,
        response: ResponseSpec,
        overrides: RouteOverrides,
        captured: BTreeMap<String, String>,
    },
    Fallback {
        response: ResponseSpec,
        captured: BTreeMap<String, String>,
    },
    Unmatched {
        captured: BTreeMap<String, String>,
    },
}

impl RouteOutcome {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            RouteOutcome::Matched { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

/// Routes in registration order, plus the fallback and custom matchers.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
    fallback: Option<ResponseSpec>,
    definitions: Vec<MatcherDefinition>,
    predicate_count: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, compile and register a route, returning its identifier.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn add_route(
        &mut self,
        config: RouteConfig,
        defaults: &FetchMockConfig,
    ) -> Result<String, RouteError> {
        let RouteConfig {
            url,
            response,
            options,
        } = config;

        if url.is_none() && !options.has_constraints() {
            return Err(RouteError::MissingMatcher);
        }
        let response = response.ok_or(RouteError::MissingResponse)?;

        let partial = options
            .match_partial_body
            .unwrap_or(defaults.match_partial_body);
        let matcher =
            CompiledRouteMatcher::compile(url.as_ref(), &options, partial, &self.definitions)?;

        let is_predicate = matches!(url, Some(UrlMatcher::Predicate(_)));
        let identifier = match &options.name {
            Some(name) => name.clone(),
            None => match url.as_ref() {
                Some(url) => url
                    .describe()
                    .unwrap_or_else(|| format!("matcher-fn-{}", self.predicate_count + 1)),
                None => WILDCARD_IDENTIFIER.to_string(),
            },
        };

        let clash = self
            .routes
            .iter()
            .position(|route| route.clashes_with(&identifier, matcher.method()));
        let overwrite = options.overwrite_routes.or(defaults.overwrite_routes);
        if clash.is_some() && overwrite.is_none() {
            return Err(RouteError::DuplicateRoute { identifier });
        }

        let route = Route {
            identifier: identifier.clone(),
            response,
            repeat: options.repeat,
            sticky: options.sticky,
            overrides: RouteOverrides {
                include_content_length: options.include_content_length,
                send_as_json: options.send_as_json,
                delay: options.delay,
            },
            matcher,
            match_count: 0,
        };

        match (clash, overwrite) {
            (Some(index), Some(true)) => {
                debug!("Replacing route {}", identifier);
                self.routes[index] = route;
            }
            _ => {
                debug!("Adding route {}", identifier);
                self.routes.push(route);
            }
        }
        if is_predicate && options.name.is_none() {
            self.predicate_count += 1;
        }
        Ok(identifier)
    }

    /// Route a call: the first active matching route wins and its counter
    /// is bumped before returning.
    pub fn execute(&mut self, call: &CallLog) -> RouteOutcome {
        let mut captured = BTreeMap::new();
        for route in self.routes.iter_mut() {
            if route.is_exhausted() {
                continue;
            }
            if route.matcher.matches(call, &mut captured) {
                route.match_count += 1;
                debug!(
                    "{} {} matched route {}",
                    call.method().to_uppercase(),
                    call.url,
                    route.identifier
                );
                return RouteOutcome::Matched {
                    identifier: route.identifier.clone(),
                    response: route.response.clone(),
                    overrides: route.overrides,
                    captured,
                };
            }
        }

        match &self.fallback {
            Some(response) => RouteOutcome::Fallback {
                response: response.clone(),
                captured,
            },
            None => RouteOutcome::Unmatched { captured },
        }
    }

    pub fn set_fallback(&mut self, response: ResponseSpec) {
        if self.fallback.is_some() {
            debug!("Replacing existing fallback response");
        }
        self.fallback = Some(response);
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn remove_routes(&mut self, options: &RemoveRouteOptions) {
        let before = self.routes.len();
        self.routes.retain(|route| {
            if route.sticky && !options.include_sticky {
                return true;
            }
            match &options.names {
                Some(names) => !names.contains(&route.identifier),
                None => false,
            }
        });
        if options.include_fallback {
            self.fallback = None;
        }
        debug!("Removed {} routes", before - self.routes.len());
    }

    /// Register a custom matcher for later routes.
    pub fn define_matcher(&mut self, definition: MatcherDefinition) -> Result<(), RouteError> {
        let taken = RESERVED_MATCHER_NAMES.contains(&definition.name.as_str())
            || self.definitions.iter().any(|d| d.name == definition.name);
        if taken {
            return Err(RouteError::MatcherAlreadyDefined(definition.name));
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Whether any route needs the request body decoded before matching.
    pub fn needs_body(&self) -> bool {
        self.routes.iter().any(Route::uses_body)
    }

    pub fn reset_counts(&mut self) {
        for route in &mut self.routes {
            route.match_count = 0;
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn find(&self, identifier: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.identifier == identifier)
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes.iter().map(Route::summary).collect()
    }

    pub fn definitions(&self) -> &[MatcherDefinition] {
        &self.definitions
    }

    /// An independent copy with every match counter at zero.
    pub fn fresh_copy(&self) -> Router {
        let mut router = self.clone();
        router.reset_counts();
        router
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
