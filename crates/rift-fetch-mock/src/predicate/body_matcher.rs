//! Request body matching.

use crate::history::CallLog;
use bytes::Bytes;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate over the raw request body.
pub type BodyPredicate = Arc<dyn Fn(Option<&Bytes>) -> bool + Send + Sync>;

/// Declared body constraint of a route.
#[derive(Clone)]
pub enum BodyMatcher {
    /// JSON body equal to (or, with partial matching, containing) the value
    Json(Value),
    Predicate(BodyPredicate),
}

impl BodyMatcher {
    pub fn json(value: Value) -> Self {
        BodyMatcher::Json(value)
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(Option<&Bytes>) -> bool + Send + Sync + 'static,
    {
        BodyMatcher::Predicate(Arc::new(predicate))
    }

    /// Whether dispatch has to decode the JSON body before matching.
    pub fn uses_body(&self) -> bool {
        matches!(self, BodyMatcher::Json(_))
    }
}

impl fmt::Debug for BodyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyMatcher::Json(value) => f.debug_tuple("Json").field(value).finish(),
            BodyMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Whether `expected` is structurally contained in `actual`.
///
/// Objects need every expected key, recursively. Arrays need every expected
/// element to be contained in some actual element. Scalars compare equal.
pub fn json_contains(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected.iter().all(|(key, value)| {
            actual
                .get(key)
                .is_some_and(|actual_value| json_contains(value, actual_value))
        }),
        (Value::Array(expected), Value::Array(actual)) => expected
            .iter()
            .all(|item| actual.iter().any(|candidate| json_contains(item, candidate))),
        _ => expected == actual,
    }
}

/// Compiled body matcher.
#[derive(Debug, Clone)]
pub struct CompiledBodyMatcher {
    matcher: BodyMatcher,
    partial: bool,
}

impl CompiledBodyMatcher {
    pub fn compile(matcher: &BodyMatcher, partial: bool) -> Self {
        CompiledBodyMatcher {
            matcher: matcher.clone(),
            partial,
        }
    }

    pub fn uses_body(&self) -> bool {
        self.matcher.uses_body()
    }

    pub fn matches(&self, call: &CallLog) -> bool {
        match &self.matcher {
            BodyMatcher::Json(expected) => {
                // bodiless methods never match a body constraint
                if matches!(call.options.method.as_str(), "get" | "head" | "delete") {
                    return false;
                }
                let compare = |sent: &Value| {
                    if self.partial {
                        json_contains(expected, sent)
                    } else {
                        expected == sent
                    }
                };
                match &call.options.parsed_body {
                    Some(sent) => compare(sent),
                    None => call.options.json_body().is_some_and(|sent| compare(&sent)),
                }
            }
            BodyMatcher::Predicate(predicate) => predicate(call.options.body.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{normalize_request, RequestInit};
    use serde_json::json;

    fn post(body: Value) -> CallLog {
        let init = RequestInit::new().method("POST").json(&body);
        CallLog::new(normalize_request("/api".into(), Some(init)).unwrap(), true)
    }

    #[test]
    fn test_json_equality() {
        let matcher = CompiledBodyMatcher::compile(&BodyMatcher::json(json!({"a": 1})), false);
        assert!(matcher.matches(&post(json!({"a": 1}))));
        assert!(!matcher.matches(&post(json!({"a": 1, "b": 2}))));
    }

    #[test]
    fn test_json_partial() {
        let matcher = CompiledBodyMatcher::compile(
            &BodyMatcher::json(json!({"a": {"b": [1]}})),
            true,
        );
        assert!(matcher.matches(&post(json!({"a": {"b": [1, 2], "c": 3}, "d": 4}))));
        assert!(!matcher.matches(&post(json!({"a": {"b": [2]}}))));
    }

    #[test]
    fn test_get_never_matches_body() {
        let matcher = CompiledBodyMatcher::compile(&BodyMatcher::json(json!({"a": 1})), false);
        let init = RequestInit::new().json(&json!({"a": 1}));
        let call = CallLog::new(normalize_request("/api".into(), Some(init)).unwrap(), true);
        assert!(!matcher.matches(&call));
    }

    #[test]
    fn test_unparsed_body_is_decoded_on_demand() {
        let matcher = CompiledBodyMatcher::compile(&BodyMatcher::json(json!([1, 2])), false);
        let init = RequestInit::new().method("put").body("[1,2]");
        let call = CallLog::new(normalize_request("/api".into(), Some(init)).unwrap(), false);
        assert!(matcher.matches(&call));
    }

    #[test]
    fn test_body_predicate() {
        let matcher = CompiledBodyMatcher::compile(
            &BodyMatcher::predicate(|body| body.is_some_and(|b| b.starts_with(b"hello"))),
            false,
        );
        let init = RequestInit::new().method("post").body("hello world");
        let call = CallLog::new(normalize_request("/api".into(), Some(init)).unwrap(), false);
        assert!(matcher.matches(&call));
        assert!(!matcher.uses_body());
    }
}
