//! Request model and URL normalization.
//!
//! # Module Structure
//!
//! - `url` - URL canonicalization, path and query extraction
//! - `types` - Request, RequestInit, FetchInput and the normalized call options

pub mod url;
mod types;

pub use self::url::{get_path, get_query, normalize_url, parse_query};
pub use types::{
    normalize_request, CallOptions, FetchInput, NormalizedRequest, Request, RequestInit,
};
