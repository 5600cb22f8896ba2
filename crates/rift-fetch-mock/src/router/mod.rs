//! Route registration and first-match routing.
//!
//! This module provides:
//! - `Router`: the ordered route table, fallback and custom matchers
//! - `Route`: one registered route with its compiled matcher and counters
//! - `RouteConfig` / `RouteOptions`: the declarative route shape
//!
//! Routes are evaluated in registration order. The first active route whose
//! matcher accepts the call wins; there is no specificity-based reordering.
//!
//! ## Module Structure
//!
//! - `types`: Route options, configs and removal options
//! - `core`: Router and Route

mod core;
mod types;


pub use self::core::{Route, RouteOutcome, Router, WILDCARD_IDENTIFIER};
pub use types::{RemoveRouteOptions, RouteConfig, RouteOptions, RouteOverrides, RouteSummary};
