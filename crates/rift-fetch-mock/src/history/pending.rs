//! Completion tracking for in-flight calls and body reads.
//!
//! Each kind of completion is an outstanding count published through a
//! `watch` channel, so any number of flushers can wait on the same work.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Settles its slot in a [`PendingSet`] when dropped.
///
/// Dropping covers every exit path of the owning task, including errors,
/// aborts and panics.
pub struct CompletionHandle {
    outstanding: Arc<watch::Sender<usize>>,
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Outstanding completions awaited by `flush`.
#[derive(Debug)]
pub struct PendingSet {
    calls: Arc<watch::Sender<usize>>,
    bodies: Arc<watch::Sender<usize>>,
}

impl Default for PendingSet {
    fn default() -> Self {
        Self {
            calls: Arc::new(watch::channel(0).0),
            bodies: Arc::new(watch::channel(0).0),
        }
    }
}

fn register(outstanding: &Arc<watch::Sender<usize>>) -> CompletionHandle {
    outstanding.send_modify(|n| *n += 1);
    CompletionHandle {
        outstanding: outstanding.clone(),
    }
}

async fn settled(outstanding: &watch::Sender<usize>) {
    let mut rx = outstanding.subscribe();
    // the sender lives as long as `outstanding`, so this cannot close
    let _ = rx.wait_for(|n| *n == 0).await;
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatched call.
    pub fn track_call(&self) -> CompletionHandle {
        register(&self.calls)
    }

    /// Register a body read on a returned response.
    pub fn track_body(&self) -> CompletionHandle {
        register(&self.bodies)
    }

    /// Number of dispatched calls that have not settled yet.
    pub fn pending_calls(&self) -> usize {
        *self.calls.borrow()
    }

    fn pending_bodies(&self) -> usize {
        *self.bodies.borrow()
    }

    /// Wait for every registered call (and body read, when asked) to settle,
    /// including handles registered while waiting.
    ///
    /// Concurrent flushes all wait for the same outstanding work.
    pub async fn flush(&self, wait_for_bodies: bool) {
        loop {
            let bodies = if wait_for_bodies {
                self.pending_bodies()
            } else {
                0
            };
            let outstanding = self.pending_calls() + bodies;
            if outstanding == 0 {
                return;
            }
            debug!("Flushing {} pending completions", outstanding);
            settled(&self.calls).await;
            if wait_for_bodies {
                settled(&self.bodies).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_flush_with_nothing_pending_returns() {
        let pending = PendingSet::new();
        pending.flush(true).await;
        assert_eq!(pending.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_flush_waits_for_handles_added_during_flush() {
        let pending = Arc::new(PendingSet::new());
        let first = pending.track_call();
        let order = Arc::new(Mutex::new(Vec::new()));

        let chained = {
            let pending = pending.clone();
            let order = order.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                let second = pending.track_call();
                drop(first);
                tokio::time::sleep(Duration::from_millis(20)).await;
                order.lock().push("second");
                drop(second);
            })
        };

        pending.flush(false).await;
        order.lock().push("flushed");
        chained.await.unwrap();

        assert_eq!(*order.lock(), vec!["second", "flushed"]);
    }

    #[tokio::test]
    async fn test_body_reads_only_awaited_when_requested() {
        let pending = PendingSet::new();
        let body = pending.track_body();

        // not waited on
        pending.flush(false).await;

        let pending = Arc::new(pending);
        let flusher = {
            let pending = pending.clone();
            tokio::spawn(async move { pending.flush(true).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!flusher.is_finished());
        drop(body);
        flusher.await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_flushes_wait_for_the_same_calls() {
        let pending = Arc::new(PendingSet::new());
        let call = pending.track_call();

        let flushers: Vec<_> = (0..2)
            .map(|_| {
                let pending = pending.clone();
                tokio::spawn(async move { pending.flush(false).await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(flushers.iter().all(|f| !f.is_finished()));
        assert_eq!(pending.pending_calls(), 1);

        drop(call);
        for flusher in flushers {
            flusher.await.unwrap();
        }
        assert_eq!(pending.pending_calls(), 0);
    }
}
