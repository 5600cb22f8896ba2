//! URL matching dialects.
//!
//! A route's URL matcher is written as a plain string (exact match after
//! normalization), a dialect-prefixed string, `*`, a regular expression or a
//! predicate over the whole call.

use super::path_matcher::ExpressMatcher;
use crate::error::RouteError;
use crate::history::CallLog;
use crate::request::{get_path, get_query, normalize_url};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Predicate over an intercepted call.
pub type CallPredicate = Arc<dyn Fn(&CallLog) -> bool + Send + Sync>;

/// Declared URL matcher of a route.
#[derive(Clone)]
pub enum UrlMatcher {
    /// `*`: matches every call
    Any,
    /// Equality after normalization
    Exact(String),
    /// `begin:` prefix match on the normalized URL
    Begin(String),
    /// `end:` suffix match on the normalized URL
    End(String),
    /// `glob:` pattern where `*` matches any run of characters
    Glob(String),
    /// `express:` path template with `:name` parameters
    Express(String),
    /// `path:` equality on the path component
    Path(String),
    Regex(Regex),
    Predicate(CallPredicate),
}

impl UrlMatcher {
    /// Parse a matcher string, recognizing the dialect prefixes.
    pub fn parse(matcher: &str) -> Self {
        if matcher == "*" {
            return UrlMatcher::Any;
        }
        let dialects: [(&str, fn(String) -> UrlMatcher); 5] = [
            ("begin:", UrlMatcher::Begin),
            ("end:", UrlMatcher::End),
            ("glob:", UrlMatcher::Glob),
            ("express:", UrlMatcher::Express),
            ("path:", UrlMatcher::Path),
        ];
        for (prefix, build) in dialects {
            if let Some(rest) = matcher.strip_prefix(prefix) {
                return build(rest.to_string());
            }
        }
        UrlMatcher::Exact(matcher.to_string())
    }

    pub fn regex(pattern: &str) -> Result<Self, RouteError> {
        Ok(UrlMatcher::Regex(Regex::new(pattern)?))
    }

    /// Match with a user function.
    ///
    /// The function runs while the owning mock's route table is locked, so it
    /// must not call back into that mock (`calls`, `called`, `routes`,
    /// `route`, ...) or it will deadlock.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&CallLog) -> bool + Send + Sync + 'static,
    {
        UrlMatcher::Predicate(Arc::new(predicate))
    }

    pub fn is_express(&self) -> bool {
        matches!(self, UrlMatcher::Express(_))
    }

    /// Textual form used to derive route identifiers. Predicates have none.
    pub fn describe(&self) -> Option<String> {
        match self {
            UrlMatcher::Any => Some("*".to_string()),
            UrlMatcher::Exact(url) => Some(normalize_url(url).unwrap_or_else(|_| url.clone())),
            UrlMatcher::Begin(v) => Some(format!("begin:{v}")),
            UrlMatcher::End(v) => Some(format!("end:{v}")),
            UrlMatcher::Glob(v) => Some(format!("glob:{v}")),
            UrlMatcher::Express(v) => Some(format!("express:{v}")),
            UrlMatcher::Path(v) => Some(format!("path:{v}")),
            UrlMatcher::Regex(regex) => Some(format!("/{}/", regex.as_str())),
            UrlMatcher::Predicate(_) => None,
        }
    }
}

impl fmt::Debug for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.describe() {
            Some(text) => write!(f, "UrlMatcher({text})"),
            None => f.write_str("UrlMatcher(<predicate>)"),
        }
    }
}

impl From<&str> for UrlMatcher {
    fn from(matcher: &str) -> Self {
        UrlMatcher::parse(matcher)
    }
}

impl From<String> for UrlMatcher {
    fn from(matcher: String) -> Self {
        UrlMatcher::parse(&matcher)
    }
}

impl From<&String> for UrlMatcher {
    fn from(matcher: &String) -> Self {
        UrlMatcher::parse(matcher)
    }
}

impl From<Regex> for UrlMatcher {
    fn from(regex: Regex) -> Self {
        UrlMatcher::Regex(regex)
    }
}

/// Translate a glob into an anchored regex: `*` matches any run of
/// characters, everything else is literal.
pub fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

fn is_pathless(url: &str) -> bool {
    get_path(url) == "/" && get_query(url).is_empty()
}

fn urls_equal(expected: &str, actual: &str) -> bool {
    expected == actual
        || (is_pathless(expected)
            && is_pathless(actual)
            && expected.trim_end_matches('/') == actual.trim_end_matches('/'))
}

/// Compiled URL matcher.
#[derive(Clone)]
pub enum CompiledUrlMatcher {
    Any,
    /// With `prefix` set (the route also constrains the query string) the
    /// expected URL only has to start the call URL.
    Exact { url: String, prefix: bool },
    Begin(String),
    End(String),
    Glob(Arc<Regex>),
    Express(Arc<ExpressMatcher>),
    Path(String),
    Regex(Arc<Regex>),
    Predicate(CallPredicate),
}

impl CompiledUrlMatcher {
    pub fn compile(matcher: &UrlMatcher, has_query: bool) -> Result<Self, RouteError> {
        let compiled = match matcher {
            UrlMatcher::Any => CompiledUrlMatcher::Any,
            UrlMatcher::Exact(url) => {
                let normalized = normalize_url(url).map_err(|source| RouteError::InvalidUrl {
                    url: url.clone(),
                    source,
                })?;
                CompiledUrlMatcher::Exact {
                    url: normalized,
                    prefix: has_query,
                }
            }
            UrlMatcher::Begin(v) => CompiledUrlMatcher::Begin(v.clone()),
            UrlMatcher::End(v) => CompiledUrlMatcher::End(v.clone()),
            UrlMatcher::Glob(v) => CompiledUrlMatcher::Glob(Arc::new(glob_to_regex(v)?)),
            UrlMatcher::Express(v) => {
                CompiledUrlMatcher::Express(Arc::new(ExpressMatcher::compile(v)?))
            }
            UrlMatcher::Path(v) => CompiledUrlMatcher::Path(v.clone()),
            UrlMatcher::Regex(regex) => CompiledUrlMatcher::Regex(Arc::new(regex.clone())),
            UrlMatcher::Predicate(predicate) => CompiledUrlMatcher::Predicate(predicate.clone()),
        };
        Ok(compiled)
    }

    /// Match the call URL. Express templates replace `captured` with the
    /// parameters they bind, whatever the outcome of the rest of the route.
    pub fn matches(&self, call: &CallLog, captured: &mut BTreeMap<String, String>) -> bool {
        match self {
            CompiledUrlMatcher::Any => true,
            CompiledUrlMatcher::Exact { url, prefix: true } => call
                .url
                .strip_prefix(url.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(['?', '&', '#'])),
            CompiledUrlMatcher::Exact { url, prefix: false } => urls_equal(url, &call.url),
            CompiledUrlMatcher::Begin(prefix) => call.url.starts_with(prefix.as_str()),
            CompiledUrlMatcher::End(suffix) => call.url.ends_with(suffix.as_str()),
            CompiledUrlMatcher::Glob(regex) => regex.is_match(&call.url),
            CompiledUrlMatcher::Express(express) => {
                captured.clear();
                match express.capture(&call.url) {
                    Some(params) => {
                        captured.extend(params);
                        true
                    }
                    None => false,
                }
            }
            CompiledUrlMatcher::Path(path) => get_path(&call.url) == *path,
            CompiledUrlMatcher::Regex(regex) => regex.is_match(&call.url),
            CompiledUrlMatcher::Predicate(predicate) => predicate(call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::normalize_request;

    fn call(url: &str) -> CallLog {
        CallLog::new(normalize_request(url.into(), None).unwrap(), false)
    }

    fn check(matcher: &str, url: &str) -> bool {
        let compiled = CompiledUrlMatcher::compile(&UrlMatcher::parse(matcher), false).unwrap();
        compiled.matches(&call(url), &mut BTreeMap::new())
    }

    #[test]
    fn test_parse_dialects() {
        assert!(matches!(UrlMatcher::parse("*"), UrlMatcher::Any));
        assert!(matches!(UrlMatcher::parse("begin:http://a"), UrlMatcher::Begin(v) if v == "http://a"));
        assert!(matches!(UrlMatcher::parse("end:.json"), UrlMatcher::End(v) if v == ".json"));
        assert!(matches!(UrlMatcher::parse("glob:/a/*"), UrlMatcher::Glob(_)));
        assert!(matches!(UrlMatcher::parse("express:/a/:b"), UrlMatcher::Express(_)));
        assert!(matches!(UrlMatcher::parse("path:/a"), UrlMatcher::Path(_)));
        assert!(matches!(UrlMatcher::parse("http://a.com"), UrlMatcher::Exact(_)));
    }

    #[test]
    fn test_exact_match() {
        assert!(check("http://it.at.there/", "http://it.at.there/"));
        assert!(check("http://it.at.there", "http://it.at.there/"));
        assert!(check("http://it.at.there/", "http://it.at.there"));
        assert!(!check("http://it.at.there/", "http://it.at.there/abouts"));
        assert!(!check("http://it.at.there/", "http://it.at.here/"));
        assert!(check("http://it.at/there/", "http://it.at/not/../there/"));
        assert!(check("/it.at/there/", "./it.at/there/"));
    }

    #[test]
    fn test_exact_is_case_sensitive() {
        assert!(!check("/Path", "/path"));
    }

    #[test]
    fn test_begin_and_end() {
        assert!(check("begin:http://it.at.there", "http://it.at.there/path"));
        assert!(!check("begin:http://it.at.there", "http://it.at.here/path"));
        assert!(check("end:there/path", "http://it.at.there/path"));
        assert!(!check("end:there/path", "http://it.at.there/path/abouts"));
    }

    #[test]
    fn test_glob() {
        assert!(check("glob:/its/*/*", "/its/a/boy"));
        assert!(check("glob:/its/*/*", "/its/a/girl"));
        assert!(!check("glob:/its/*/*", "/its/alive"));
        assert!(check("glob:*/path?a=b", "http://x.com/path?a=b"));
    }

    #[test]
    fn test_path() {
        assert!(check("path:/its/not/:clever", "/its/not/:clever"));
        assert!(check("path:/its/not/:clever", "/its/not/:clever?brain=false"));
        assert!(!check("path:/its/not/:clever", "/its/not/boy"));
        assert!(!check("path:/its/not/:clever", "/its/not/:clever/still"));
    }

    #[test]
    fn test_regex_and_predicate() {
        let regex = CompiledUrlMatcher::compile(
            &UrlMatcher::regex(r"http://it\.at\.there/\d+").unwrap(),
            false,
        )
        .unwrap();
        assert!(regex.matches(&call("http://it.at.there/12345"), &mut BTreeMap::new()));
        assert!(!regex.matches(&call("http://it.at.there/abcde"), &mut BTreeMap::new()));

        let predicate = CompiledUrlMatcher::compile(
            &UrlMatcher::predicate(|call| call.url.contains("person")),
            false,
        )
        .unwrap();
        assert!(predicate.matches(&call("http://domain.com/person"), &mut BTreeMap::new()));
        assert!(!predicate.matches(&call("http://domain.com/place"), &mut BTreeMap::new()));
    }

    #[test]
    fn test_exact_with_query_constraint_is_prefix() {
        let compiled =
            CompiledUrlMatcher::compile(&UrlMatcher::parse("http://it.at.there/?c=d"), true).unwrap();
        let mut captured = BTreeMap::new();
        assert!(compiled.matches(&call("http://it.at.there?c=d&a=b"), &mut captured));
        assert!(!compiled.matches(&call("http://it.at.there?a=b&c=d"), &mut captured));
        assert!(!compiled.matches(&call("http://it.at.there/other?c=d"), &mut captured));
    }

    #[test]
    fn test_express_writes_captured_params() {
        let compiled =
            CompiledUrlMatcher::compile(&UrlMatcher::parse("express:/type/:instance"), false).unwrap();
        let mut captured = BTreeMap::new();
        assert!(compiled.matches(&call("/type/a"), &mut captured));
        assert_eq!(captured.get("instance").map(String::as_str), Some("a"));

        assert!(!compiled.matches(&call("/nottype/a"), &mut captured));
        assert!(captured.is_empty());
    }

    #[test]
    fn test_invalid_regex_in_glob_never_happens() {
        assert!(glob_to_regex("glob(with)[brackets]*").is_ok());
    }

    #[test]
    fn test_describe() {
        assert_eq!(UrlMatcher::parse("http://a.com").describe().unwrap(), "http://a.com/");
        assert_eq!(UrlMatcher::parse("begin:/x").describe().unwrap(), "begin:/x");
        assert_eq!(UrlMatcher::regex("a+").unwrap().describe().unwrap(), "/a+/");
        assert!(UrlMatcher::predicate(|_| true).describe().is_none());
    }
}
