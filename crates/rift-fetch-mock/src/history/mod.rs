//! Call history: every intercepted call, matched or not, in dispatch order.
//!
//! # Module Structure
//!
//! - `types` - CallLog, the record of one intercepted call
//! - `store` - CallHistory, the append-only ledger
//! - `filter` - CallFilter selectors used by history queries
//! - `pending` - Completion handles awaited by `flush`

mod filter;
mod pending;
mod store;
mod types;

pub use filter::CallFilter;
pub use pending::{CompletionHandle, PendingSet};
pub use store::CallHistory;
pub use types::CallLog;
