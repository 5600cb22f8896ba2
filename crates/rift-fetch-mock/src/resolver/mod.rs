//! Turning a route's declared response into a realized [`crate::MockResponse`].
//!
//! # Module Structure
//!
//! - `spec` - ResponseSpec, ResponseConfig and JSON classification
//! - `resolve` - The resolution loop and response synthesis

mod resolve;
mod spec;

pub use resolve::{resolve_response, validate_status, ResolveOptions};
pub use spec::{
    classify_json, ConfigBody, ResponseConfig, ResponseFn, ResponseSpec, SpecFuture, CONFIG_KEYS,
};
