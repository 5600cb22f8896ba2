//! Call history store.

use super::types::CallLog;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Append-only, dispatch-ordered record of intercepted calls.
#[derive(Default)]
pub struct CallHistory {
    calls: RwLock<Vec<Arc<CallLog>>>,
}

impl CallHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call. Happens before its response is resolved.
    pub fn record_call(&self, call: Arc<CallLog>) {
        debug!(
            "Recorded {} {} ({})",
            call.method(),
            call.url,
            call.route.as_deref().unwrap_or("unmatched")
        );
        self.calls.write().push(call);
    }

    /// Calls satisfying `predicate`, in dispatch order.
    pub fn filter<F>(&self, predicate: F) -> Vec<Arc<CallLog>>
    where
        F: Fn(&CallLog) -> bool,
    {
        self.calls
            .read()
            .iter()
            .filter(|call| predicate(call))
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Arc<CallLog>> {
        self.calls.read().clone()
    }

    pub fn count_for_route(&self, identifier: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|call| call.route.as_deref() == Some(identifier))
            .count()
    }

    pub fn clear(&self) {
        self.calls.write().clear();
    }

    pub fn len(&self) -> usize {
        self.calls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::normalize_request;

    fn call(url: &str, route: Option<&str>) -> Arc<CallLog> {
        let mut call = CallLog::new(normalize_request(url.into(), None).unwrap(), false);
        call.route = route.map(str::to_string);
        Arc::new(call)
    }

    #[test]
    fn test_record_preserves_order() {
        let history = CallHistory::new();
        history.record_call(call("/a", Some("/a")));
        history.record_call(call("/b", None));
        history.record_call(call("/c", Some("/c")));

        let urls: Vec<_> = history.all().iter().map(|c| c.url.clone()).collect();
        assert_eq!(urls, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_filter_and_count() {
        let history = CallHistory::new();
        history.record_call(call("/a", Some("/a")));
        history.record_call(call("/a", Some("/a")));
        history.record_call(call("/z", None));

        assert_eq!(history.filter(|c| c.is_matched()).len(), 2);
        assert_eq!(history.filter(|c| !c.is_matched()).len(), 1);
        assert_eq!(history.count_for_route("/a"), 2);
        assert_eq!(history.count_for_route("/z"), 0);
    }

    #[test]
    fn test_clear() {
        let history = CallHistory::new();
        history.record_call(call("/a", None));
        assert_eq!(history.len(), 1);
        history.clear();
        assert!(history.is_empty());
    }
}
