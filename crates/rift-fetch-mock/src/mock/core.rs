//! The `FetchMock` instance: registration, history queries and lifecycle.

use crate::config::{FetchMockConfig, RouteFile};
use crate::error::{ConfigError, RouteError};
use crate::history::{CallFilter, CallHistory, CallLog, PendingSet};
use crate::predicate::{CompiledRouteMatcher, MatcherDefinition, UrlMatcher};
use crate::request::{normalize_url, CallOptions};
use crate::resolver::ResponseSpec;
use crate::response::MockResponse;
use crate::router::{RemoveRouteOptions, RouteConfig, RouteOptions, RouteSummary, Router};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Options for [`FetchMock::reset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetOptions {
    /// Also remove sticky routes
    pub include_sticky: bool,
}

pub(crate) struct Inner {
    pub(crate) config: FetchMockConfig,
    pub(crate) router: RwLock<Router>,
    pub(crate) history: CallHistory,
    pub(crate) pending: Arc<PendingSet>,
}

/// A mock fetch implementation.
///
/// Cloning yields another handle to the same routes and history; use
/// [`FetchMock::create_instance`] for an independent copy.
#[derive(Clone)]
pub struct FetchMock {
    pub(crate) inner: Arc<Inner>,
}

/// How a history query selects calls before options are applied.
enum Selection {
    All,
    Matched,
    Unmatched,
    Route(String),
    Matcher(UrlMatcher),
}

impl FetchMock {
    pub fn new(config: FetchMockConfig) -> Self {
        Self::with_router(config, Router::new())
    }

    fn with_router(config: FetchMockConfig, router: Router) -> Self {
        FetchMock {
            inner: Arc::new(Inner {
                config,
                router: RwLock::new(router),
                history: CallHistory::new(),
                pending: Arc::new(PendingSet::new()),
            }),
        }
    }

    /// An independent instance with a copy of the current routes and
    /// settings, an empty history and fresh match counters.
    pub fn create_instance(&self) -> FetchMock {
        let router = self.inner.router.read().fresh_copy();
        Self::with_router(self.inner.config.clone(), router)
    }

    /// Build an instance from a route file, applying its settings.
    pub fn from_route_file<P: AsRef<Path>>(path: P) -> Result<FetchMock, ConfigError> {
        let file = RouteFile::load(path)?;
        let mut config = FetchMockConfig::default();
        if let Some(settings) = &file.config {
            config.merge_file_settings(settings);
        }
        let mock = FetchMock::new(config);
        mock.apply_route_file(&file)?;
        Ok(mock)
    }

    /// Register the routes (and fallback) of a route file on this instance.
    ///
    /// The file's `config` section is ignored; settings are fixed at
    /// construction.
    pub fn load_routes<P: AsRef<Path>>(&self, path: P) -> Result<&Self, ConfigError> {
        let file = RouteFile::load(path)?;
        if file.config.is_some() {
            debug!("Ignoring config section of route file for an existing instance");
        }
        self.apply_route_file(&file)
    }

    pub fn apply_route_file(&self, file: &RouteFile) -> Result<&Self, ConfigError> {
        let configs = file.route_configs()?;
        let mut router = self.inner.router.write();
        for (index, config) in configs.into_iter().enumerate() {
            router
                .add_route(config, &self.inner.config)
                .map_err(|source| ConfigError::Route { index, source })?;
        }
        if let Some(fallback) = file.fallback_response() {
            router.set_fallback(fallback);
        }
        info!("Registered {} routes from route file", file.routes.len());
        Ok(self)
    }

    pub fn config(&self) -> &FetchMockConfig {
        &self.inner.config
    }

    // ===== Registration =====

    /// Add a route. `options` may be [`RouteOptions`] or a method string.
    pub fn route(
        &self,
        matcher: impl Into<UrlMatcher>,
        response: impl Into<ResponseSpec>,
        options: impl Into<RouteOptions>,
    ) -> Result<&Self, RouteError> {
        self.route_config(
            RouteConfig::new()
                .url(matcher)
                .response(response)
                .options(options.into()),
        )
    }

    /// Add a route described by a single config.
    pub fn route_config(&self, config: RouteConfig) -> Result<&Self, RouteError> {
        self.inner
            .router
            .write()
            .add_route(config, &self.inner.config)?;
        Ok(self)
    }

    /// Respond with `response` to calls that match no route.
    pub fn catch(&self, response: impl Into<ResponseSpec>) -> &Self {
        self.inner.router.write().set_fallback(response.into());
        self
    }

    /// Respond with an empty 200 to calls that match no route.
    pub fn catch_default(&self) -> &Self {
        self.catch(ResponseSpec::Status(200))
    }

    pub fn remove_routes(&self, options: RemoveRouteOptions) -> &Self {
        self.inner.router.write().remove_routes(&options);
        self
    }

    /// Register a custom matcher usable through `RouteOptions::extension`.
    pub fn define_matcher(&self, definition: MatcherDefinition) -> Result<&Self, RouteError> {
        self.inner.router.write().define_matcher(definition)?;
        Ok(self)
    }

    pub fn routes(&self) -> Vec<RouteSummary> {
        self.inner.router.read().summaries()
    }

    // ===== History =====

    /// Calls selected by `filter` and, when given, matching `options`.
    pub fn calls(
        &self,
        filter: impl Into<CallFilter>,
        options: Option<RouteOptions>,
    ) -> Vec<Arc<CallLog>> {
        let selection = self.selection(filter.into());
        let matcher = match self.compile_query(&selection, options) {
            Ok(matcher) => matcher,
            Err(e) => {
                warn!("Invalid call filter: {}", e);
                return Vec::new();
            }
        };

        self.inner.history.filter(|call| {
            let selected = match &selection {
                Selection::All | Selection::Matcher(_) => true,
                Selection::Matched => call.is_matched(),
                Selection::Unmatched => !call.is_matched(),
                Selection::Route(identifier) => call.route.as_deref() == Some(identifier.as_str()),
            };
            selected
                && matcher
                    .as_ref()
                    .is_none_or(|m| m.matches(call, &mut BTreeMap::new()))
        })
    }

    pub fn last_call(
        &self,
        filter: impl Into<CallFilter>,
        options: Option<RouteOptions>,
    ) -> Option<Arc<CallLog>> {
        self.calls(filter, options).pop()
    }

    pub fn last_url(
        &self,
        filter: impl Into<CallFilter>,
        options: Option<RouteOptions>,
    ) -> Option<String> {
        self.last_call(filter, options).map(|call| call.url.clone())
    }

    pub fn last_options(
        &self,
        filter: impl Into<CallFilter>,
        options: Option<RouteOptions>,
    ) -> Option<CallOptions> {
        self.last_call(filter, options)
            .map(|call| call.options.clone())
    }

    pub fn last_response(
        &self,
        filter: impl Into<CallFilter>,
        options: Option<RouteOptions>,
    ) -> Option<MockResponse> {
        self.last_call(filter, options)
            .and_then(|call| call.response().cloned())
    }

    pub fn called(&self, filter: impl Into<CallFilter>, options: Option<RouteOptions>) -> bool {
        !self.calls(filter, options).is_empty()
    }

    /// Whether every route has been called, and called at least `repeat`
    /// times where a limit was declared. Each unmet expectation is logged.
    pub fn done(&self) -> bool {
        self.check_done(None)
    }

    /// [`FetchMock::done`] restricted to the named routes.
    pub fn done_routes<I, S>(&self, identifiers: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers = identifiers.into_iter().map(Into::into).collect();
        self.check_done(Some(identifiers))
    }

    fn check_done(&self, identifiers: Option<Vec<String>>) -> bool {
        let router = self.inner.router.read();
        let mut done = true;
        for route in router.routes() {
            if identifiers
                .as_ref()
                .is_some_and(|ids| !ids.contains(&route.identifier))
            {
                continue;
            }
            let count = self.inner.history.count_for_route(&route.identifier);
            if count == 0 {
                warn!("Warning: {} not called", route.identifier);
                done = false;
                continue;
            }
            if let Some(expected) = route.repeat {
                if count < expected as usize {
                    warn!(
                        "Warning: {} only called {} times, but {} expected",
                        route.identifier, count, expected
                    );
                    done = false;
                }
            }
        }
        done
    }

    // ===== Lifecycle =====

    /// Wait for every dispatched call to settle; with `wait_for_bodies`,
    /// also for body reads started on returned responses.
    pub async fn flush(&self, wait_for_bodies: bool) {
        self.inner.pending.flush(wait_for_bodies).await;
    }

    /// Forget recorded calls and reset every route's match counter.
    pub fn clear_history(&self) -> &Self {
        let mut router = self.inner.router.write();
        self.inner.history.clear();
        router.reset_counts();
        self
    }

    /// Clear history and remove routes (keeping sticky ones unless asked)
    /// and the fallback.
    pub fn reset(&self, options: ResetOptions) -> &Self {
        let remove = RemoveRouteOptions {
            include_sticky: options.include_sticky,
            ..Default::default()
        };
        self.remove_routes(remove);
        self.clear_history()
    }

    fn selection(&self, filter: CallFilter) -> Selection {
        match filter {
            CallFilter::All => Selection::All,
            CallFilter::Matched => Selection::Matched,
            CallFilter::Unmatched => Selection::Unmatched,
            CallFilter::Matcher(matcher) => Selection::Matcher(matcher),
            CallFilter::Name(name) => {
                let router = self.inner.router.read();
                if router.find(&name).is_some() {
                    return Selection::Route(name);
                }
                if let Ok(normalized) = normalize_url(&name) {
                    if router.find(&normalized).is_some() {
                        return Selection::Route(normalized);
                    }
                }
                Selection::Matcher(UrlMatcher::parse(&name))
            }
        }
    }

    /// Compile the ad hoc matcher a query applies to each stored call.
    fn compile_query(
        &self,
        selection: &Selection,
        options: Option<RouteOptions>,
    ) -> Result<Option<CompiledRouteMatcher>, RouteError> {
        let url = match selection {
            Selection::Matcher(matcher) => matcher.clone(),
            _ if options.is_some() => UrlMatcher::Any,
            _ => return Ok(None),
        };
        let options = options.unwrap_or_default();
        let partial = options
            .match_partial_body
            .unwrap_or(self.inner.config.match_partial_body);
        let router = self.inner.router.read();
        CompiledRouteMatcher::compile(Some(&url), &options, partial, router.definitions()).map(Some)
    }
}

impl Default for FetchMock {
    fn default() -> Self {
        FetchMock::new(FetchMockConfig::default())
    }
}
