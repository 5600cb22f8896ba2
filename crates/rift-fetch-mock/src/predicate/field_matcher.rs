//! Header, query and path-parameter matchers.

use hyper::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declared header or query value: one value or an ordered list.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    pub fn values(&self) -> Vec<String> {
        match self {
            FieldValue::One(v) => vec![v.clone()],
            FieldValue::Many(vs) => vs.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::One(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::One(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Many(values)
    }
}

/// Compiled header matcher.
///
/// Every declared header must be present with exactly the declared values,
/// in order. Undeclared headers on the call are ignored.
#[derive(Debug, Clone)]
pub struct CompiledHeaderMatcher {
    /// Expected values by lower-cased header name
    expected: Vec<(String, Vec<String>)>,
}

impl CompiledHeaderMatcher {
    pub fn compile(headers: &BTreeMap<String, FieldValue>) -> Self {
        CompiledHeaderMatcher {
            expected: headers
                .iter()
                .map(|(name, value)| (name.to_lowercase(), value.values()))
                .collect(),
        }
    }

    pub fn matches(&self, headers: &HeaderMap) -> bool {
        self.expected.iter().all(|(name, expected)| {
            let mut actual: Vec<String> = headers
                .get_all(name.as_str())
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_string))
                .collect();
            // a single comma-joined value can satisfy a declared list
            if actual.len() == 1 && expected.len() > 1 {
                actual = actual[0].split(',').map(|v| v.trim().to_string()).collect();
            }
            actual == *expected
        })
    }
}

/// Compiled query matcher: every declared pair must occur among the call's
/// query pairs, in any order.
#[derive(Debug, Clone)]
pub struct CompiledQueryMatcher {
    expected: Vec<(String, String)>,
}

impl CompiledQueryMatcher {
    pub fn compile(query: &BTreeMap<String, FieldValue>) -> Self {
        CompiledQueryMatcher {
            expected: query
                .iter()
                .flat_map(|(key, value)| {
                    value
                        .values()
                        .into_iter()
                        .map(move |v| (key.clone(), v))
                })
                .collect(),
        }
    }

    pub fn matches(&self, query: &[(String, String)]) -> bool {
        self.expected.iter().all(|pair| query.contains(pair))
    }
}

/// Compiled `params` constraint for `express:` routes.
///
/// Only declared names are checked; other bound parameters just need to
/// exist, which the template match already guarantees.
#[derive(Debug, Clone)]
pub struct CompiledParamsMatcher {
    expected: BTreeMap<String, String>,
}

impl CompiledParamsMatcher {
    pub fn compile(params: &BTreeMap<String, String>) -> Self {
        CompiledParamsMatcher {
            expected: params.clone(),
        }
    }

    pub fn matches(&self, captured: &BTreeMap<String, String>) -> bool {
        self.expected
            .iter()
            .all(|(name, value)| captured.get(name) == Some(value))
    }
}
