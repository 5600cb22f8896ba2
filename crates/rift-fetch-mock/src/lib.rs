//! Rift fetch mock: an in-process stand-in for a network fetch function.
//!
//! Routes pair URL/method/header/query/body matchers with canned responses.
//! Every call dispatched through [`FetchMock::fetch`] is normalized, matched
//! against the routes in registration order, recorded in the call history and
//! answered with a synthesized response.

// ===== Core interception engine =====
pub mod history;
pub mod mock;
pub mod predicate;
pub mod resolver;
pub mod router;

// ===== Request/response model and collaborators =====
pub mod config;
pub mod error;
pub mod network;
pub mod request;
pub mod response;

pub use config::{FallbackMode, FetchMockConfig, RouteDefinition, RouteFile};
pub use error::{ConfigError, FetchMockError, RouteError};
pub use history::{CallFilter, CallLog};
pub use mock::{FetchMock, PendingFetch, ResetOptions};
pub use network::{FetchClient, ReqwestClient};
pub use predicate::{BodyMatcher, FieldValue, MatcherDefinition, UrlMatcher};
pub use request::{FetchInput, Request, RequestInit};
pub use resolver::{ResponseConfig, ResponseSpec};
pub use response::{Body, MockResponse, ResponseBuilder};
pub use router::{RemoveRouteOptions, RouteConfig, RouteOptions};
