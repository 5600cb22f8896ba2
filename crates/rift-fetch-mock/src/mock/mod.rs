//! The mock fetch instance.
//!
//! This module provides:
//! - `FetchMock`: route registration, dispatch, history queries and lifecycle
//! - `PendingFetch`: the future returned for each dispatched call
//!
//! Each instance owns its routes, history and pending-call set; nothing is
//! shared between instances.
//!
//! ## Module Structure
//!
//! - `core`: FetchMock construction, registration and history queries
//! - `handler`: Call dispatch and response tasks

mod core;
mod handler;


pub use self::core::{FetchMock, ResetOptions};
pub use handler::PendingFetch;
