//! Combined matcher for one route.
//!
//! The URL matcher and every structural constraint are ANDed together.

use super::body_matcher::CompiledBodyMatcher;
use super::definition::MatcherDefinition;
use super::field_matcher::{CompiledHeaderMatcher, CompiledParamsMatcher, CompiledQueryMatcher};
use super::url_matcher::{CompiledUrlMatcher, UrlMatcher};
use crate::error::RouteError;
use crate::history::CallLog;
use crate::router::RouteOptions;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone)]
struct CompiledExtension {
    name: String,
    expected: Value,
    definition: MatcherDefinition,
}

/// Compiled form of a route's matching configuration.
#[derive(Clone)]
pub struct CompiledRouteMatcher {
    url: Option<CompiledUrlMatcher>,
    method: Option<String>,
    headers: Option<CompiledHeaderMatcher>,
    query: Option<CompiledQueryMatcher>,
    params: Option<CompiledParamsMatcher>,
    body: Option<CompiledBodyMatcher>,
    extensions: Vec<CompiledExtension>,
    uses_body: bool,
}

impl CompiledRouteMatcher {
    /// Compile a URL matcher and route options.
    ///
    /// `match_partial_body` is the effective setting after route-level
    /// overrides have been applied.
    pub fn compile(
        url: Option<&UrlMatcher>,
        options: &RouteOptions,
        match_partial_body: bool,
        definitions: &[MatcherDefinition],
    ) -> Result<Self, RouteError> {
        if url.is_none() && !options.has_constraints() {
            return Err(RouteError::MissingMatcher);
        }
        if options.params.is_some() && !url.is_some_and(UrlMatcher::is_express) {
            return Err(RouteError::ParamsWithoutExpress);
        }

        let url = url
            .map(|matcher| CompiledUrlMatcher::compile(matcher, options.query.is_some()))
            .transpose()?;

        let extensions = options
            .extensions
            .iter()
            .map(|(name, expected)| {
                definitions
                    .iter()
                    .find(|def| def.name == *name)
                    .map(|definition| CompiledExtension {
                        name: name.clone(),
                        expected: expected.clone(),
                        definition: definition.clone(),
                    })
                    .ok_or_else(|| RouteError::UnknownMatcher(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let body = options
            .body
            .as_ref()
            .map(|body| CompiledBodyMatcher::compile(body, match_partial_body));
        let uses_body = body.as_ref().is_some_and(CompiledBodyMatcher::uses_body)
            || extensions.iter().any(|ext| ext.definition.uses_body);

        Ok(CompiledRouteMatcher {
            url,
            method: options.method.as_ref().map(|m| m.to_lowercase()),
            headers: options.headers.as_ref().map(CompiledHeaderMatcher::compile),
            query: options.query.as_ref().map(CompiledQueryMatcher::compile),
            params: options.params.as_ref().map(CompiledParamsMatcher::compile),
            body,
            extensions,
            uses_body,
        })
    }

    /// Whether dispatch has to decode the JSON body before matching.
    pub fn uses_body(&self) -> bool {
        self.uses_body
    }

    /// Lower-cased method constraint, if any.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Evaluate the route against a call.
    ///
    /// `captured` receives the parameters bound by an `express:` URL matcher,
    /// even when a later constraint rejects the call.
    pub fn matches(&self, call: &CallLog, captured: &mut BTreeMap<String, String>) -> bool {
        if let Some(url) = &self.url {
            if !url.matches(call, captured) {
                return false;
            }
        }
        if let Some(method) = &self.method {
            if call.options.method != *method {
                return false;
            }
        }
        if let Some(headers) = &self.headers {
            if !headers.matches(&call.options.headers) {
                return false;
            }
        }
        if let Some(query) = &self.query {
            if !query.matches(&call.query) {
                return false;
            }
        }
        if let Some(params) = &self.params {
            if !params.matches(captured) {
                return false;
            }
        }
        if let Some(body) = &self.body {
            if !body.matches(call) {
                return false;
            }
        }
        self.extensions
            .iter()
            .all(|ext| (ext.definition.matcher)(&ext.expected, call))
    }
}

impl fmt::Debug for CompiledRouteMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRouteMatcher")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("body", &self.body)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| &e.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::BodyMatcher;
    use crate::request::{normalize_request, RequestInit};
    use serde_json::json;

    fn call(url: &str, init: Option<RequestInit>) -> CallLog {
        CallLog::new(normalize_request(url.into(), init).unwrap(), true)
    }

    fn compile(url: Option<&str>, options: RouteOptions) -> Result<CompiledRouteMatcher, RouteError> {
        let url = url.map(UrlMatcher::parse);
        CompiledRouteMatcher::compile(url.as_ref(), &options, false, &[])
    }

    #[test]
    fn test_missing_matcher() {
        let err = compile(None, RouteOptions::default()).unwrap_err();
        assert!(matches!(err, RouteError::MissingMatcher));
    }

    #[test]
    fn test_structural_only_route() {
        let matcher = compile(None, RouteOptions::default().method("POST")).unwrap();
        let mut captured = BTreeMap::new();
        assert!(matcher.matches(&call("/a", Some(RequestInit::new().method("post"))), &mut captured));
        assert!(!matcher.matches(&call("/a", None), &mut captured));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let matcher = compile(Some("*"), RouteOptions::default().method("get")).unwrap();
        let mut captured = BTreeMap::new();
        assert!(matcher.matches(&call("/a", Some(RequestInit::new().method("GET"))), &mut captured));
        assert!(matcher.matches(&call("/a", None), &mut captured));
    }

    #[test]
    fn test_params_require_express() {
        let err = compile(Some("/type/a"), RouteOptions::default().param("instance", "a"))
            .unwrap_err();
        assert!(matches!(err, RouteError::ParamsWithoutExpress));
    }

    #[test]
    fn test_params_constraint() {
        let matcher = compile(
            Some("express:/:type/:instance"),
            RouteOptions::default()
                .param("instance", "b")
                .param("type", "cat"),
        )
        .unwrap();
        let mut captured = BTreeMap::new();
        assert!(!matcher.matches(&call("/", None), &mut captured));
        assert!(!matcher.matches(&call("/dog/a", None), &mut captured));
        assert!(!matcher.matches(&call("/cat/a", None), &mut captured));
        assert!(!matcher.matches(&call("/dog/b", None), &mut captured));
        assert!(matcher.matches(&call("/cat/b", None), &mut captured));
    }

    #[test]
    fn test_captures_written_when_params_reject() {
        let matcher = compile(
            Some("express:/type/:instance"),
            RouteOptions::default().param("instance", "b"),
        )
        .unwrap();
        let mut captured = BTreeMap::new();
        assert!(!matcher.matches(&call("/type/a", None), &mut captured));
        assert_eq!(captured.get("instance").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_query_alongside_url() {
        let matcher =
            compile(Some("http://it.at.there/"), RouteOptions::default().query("a", "b")).unwrap();
        let mut captured = BTreeMap::new();
        assert!(!matcher.matches(&call("http://it.at.there", None), &mut captured));
        assert!(matcher.matches(&call("http://it.at.there?a=b", None), &mut captured));
        assert!(matcher.matches(&call("http://it.at.there?c=d&a=b", None), &mut captured));
    }

    #[test]
    fn test_body_flags_route() {
        let matcher = compile(
            Some("/api"),
            RouteOptions::default().body(BodyMatcher::json(json!({"a": 1}))),
        )
        .unwrap();
        assert!(matcher.uses_body());
    }

    #[test]
    fn test_unknown_extension() {
        let err = compile(
            Some("*"),
            RouteOptions::default().extension("isAuthorized", json!(true)),
        )
        .unwrap_err();
        assert!(matches!(err, RouteError::UnknownMatcher(name) if name == "isAuthorized"));
    }

    #[test]
    fn test_defined_extension() {
        let definitions = [MatcherDefinition::new("isAuthorized", |expected, call| {
            let authorized = call.options.header("authorization").is_some();
            expected.as_bool() == Some(authorized)
        })];
        let options = RouteOptions::default().extension("isAuthorized", json!(true));
        let url = UrlMatcher::Any;
        let matcher =
            CompiledRouteMatcher::compile(Some(&url), &options, false, &definitions).unwrap();

        let mut captured = BTreeMap::new();
        let authed = RequestInit::new().header("authorization", "Bearer x");
        assert!(matcher.matches(&call("/a", Some(authed)), &mut captured));
        assert!(!matcher.matches(&call("/a", None), &mut captured));
    }
}
