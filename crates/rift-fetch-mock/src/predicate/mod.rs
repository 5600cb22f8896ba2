//! Matcher compilation.
//!
//! A route's matching configuration (URL dialect plus method, header, query,
//! path-parameter, body and custom constraints) is compiled once at
//! registration into a [`CompiledRouteMatcher`], then evaluated against each
//! call in registration order.
//!
//! # Module Structure
//!
//! - `url_matcher` - URL dialects (exact, begin, end, glob, express, path, regex, predicate)
//! - `path_matcher` - Express path templates
//! - `field_matcher` - Header, query and path-parameter constraints
//! - `body_matcher` - JSON and predicate body constraints
//! - `definition` - User-defined matchers
//! - `route_matcher` - The combined per-route matcher

mod body_matcher;
mod definition;
mod field_matcher;
mod path_matcher;
mod route_matcher;
mod url_matcher;

pub use body_matcher::{json_contains, BodyMatcher, BodyPredicate, CompiledBodyMatcher};
pub use definition::{ExtensionFn, MatcherDefinition, RESERVED_MATCHER_NAMES};
pub use field_matcher::{
    CompiledHeaderMatcher, CompiledParamsMatcher, CompiledQueryMatcher, FieldValue,
};
pub use path_matcher::ExpressMatcher;
pub use route_matcher::CompiledRouteMatcher;
pub use url_matcher::{glob_to_regex, CallPredicate, CompiledUrlMatcher, UrlMatcher};
