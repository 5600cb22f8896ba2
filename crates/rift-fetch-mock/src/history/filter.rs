use crate::predicate::UrlMatcher;
use regex::Regex;

/// Selects calls from the history.
///
/// A string names a route when a route with that identifier exists; any
/// other string is compiled into an ad hoc URL matcher.
#[derive(Debug, Clone, Default)]
pub enum CallFilter {
    #[default]
    All,
    Matched,
    Unmatched,
    Name(String),
    Matcher(UrlMatcher),
}

impl From<bool> for CallFilter {
    fn from(matched: bool) -> Self {
        if matched {
            CallFilter::Matched
        } else {
            CallFilter::Unmatched
        }
    }
}

impl From<&str> for CallFilter {
    fn from(filter: &str) -> Self {
        match filter {
            "matched" => CallFilter::Matched,
            "unmatched" => CallFilter::Unmatched,
            other => CallFilter::Name(other.to_string()),
        }
    }
}

impl From<String> for CallFilter {
    fn from(filter: String) -> Self {
        CallFilter::from(filter.as_str())
    }
}

impl From<Option<&str>> for CallFilter {
    fn from(filter: Option<&str>) -> Self {
        filter.map(CallFilter::from).unwrap_or_default()
    }
}

impl From<Regex> for CallFilter {
    fn from(regex: Regex) -> Self {
        CallFilter::Matcher(UrlMatcher::Regex(regex))
    }
}

impl From<UrlMatcher> for CallFilter {
    fn from(matcher: UrlMatcher) -> Self {
        CallFilter::Matcher(matcher)
    }
}
