// SPDX-License-Identifier: MIT

//! Debounced mutation watching for redraw-style consumers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::dom::{DocumentTree, MutationBatch};

/// Default quiet period: long enough to coalesce a burst of listing
/// mutations, short enough to feel immediate.
pub const DEFAULT_QUIET: Duration = Duration::from_millis(30);

/// Coalescing consumer of the mutation feed.
///
/// Each qualifying batch re-arms a quiet-period timer; when the document
/// settles, the watcher disconnects its subscription, runs `redraw`, and
/// re-subscribes, so mutations caused by the redraw itself never re-trigger
/// it. Batches matching `ignore` (e.g. "the listing's loading placeholder
/// was removed") signal an intermediate loading state and do not arm the
/// timer.
pub struct DebouncedWatcher {
    handle: JoinHandle<()>,
}

impl DebouncedWatcher {
    pub fn spawn(
        doc: Arc<dyn DocumentTree>,
        quiet: Duration,
        ignore: impl Fn(&MutationBatch) -> bool + Send + 'static,
        redraw: impl Fn() + Send + 'static,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut feed = doc.subscribe();
            let mut deadline: Option<Instant> = None;
            loop {
                let fire = tokio::select! {
                    received = feed.recv() => match received {
                        Ok(batch) => {
                            if !ignore(&batch) {
                                deadline = Some(Instant::now() + quiet);
                            }
                            false
                        }
                        Err(RecvError::Lagged(_)) => {
                            deadline = Some(Instant::now() + quiet);
                            false
                        }
                        Err(RecvError::Closed) => return,
                    },
                    _ = sleep_until_opt(deadline), if deadline.is_some() => true,
                };

                if fire {
                    deadline = None;
                    drop(feed);
                    redraw();
                    feed = doc.subscribe();
                }
            }
        });
        Self { handle }
    }

    /// Stop watching. The task only suspends between reactions, so a redraw
    /// in progress always completes.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for DebouncedWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::sim::{SimDocument, SimNode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let cloned = count.clone();
        (count, move || {
            cloned.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn burst_coalesces_into_one_redraw() {
        let doc = SimDocument::new();
        let (redraws, redraw) = counter();
        let watcher = DebouncedWatcher::spawn(
            Arc::new(doc.clone()),
            DEFAULT_QUIET,
            |_| false,
            redraw,
        );
        tokio::task::yield_now().await;

        for i in 0..5 {
            doc.insert_nodes(vec![SimNode::new(format!("row:{}", i))]);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(redraws.load(Ordering::SeqCst), 1);
        watcher.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_batches_do_not_arm_the_timer() {
        let doc = SimDocument::with_nodes(vec![SimNode::new("releases-table")]);
        let (redraws, redraw) = counter();
        let _watcher = DebouncedWatcher::spawn(
            Arc::new(doc.clone()),
            DEFAULT_QUIET,
            |batch| batch.removed("releases-table"),
            redraw,
        );
        tokio::task::yield_now().await;

        // The loading placeholder replacing the table is an intermediate
        // state; nothing should fire.
        doc.remove(&["releases-table".to_string()]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(redraws.load(Ordering::SeqCst), 0);

        // Real content arriving does fire.
        doc.insert_nodes(vec![SimNode::new("row:0")]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(redraws.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn redraw_mutations_do_not_retrigger() {
        let doc = SimDocument::new();
        let redraws = Arc::new(AtomicUsize::new(0));
        let redraw = {
            let redraws = redraws.clone();
            let doc = doc.clone();
            move || {
                redraws.fetch_add(1, Ordering::SeqCst);
                // The reaction mutates the document it watches.
                doc.insert_nodes(vec![SimNode::new("overlay")]);
            }
        };
        let _watcher =
            DebouncedWatcher::spawn(Arc::new(doc.clone()), DEFAULT_QUIET, |_| false, redraw);
        tokio::task::yield_now().await;

        doc.insert_nodes(vec![SimNode::new("row:0")]);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(redraws.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_reactions() {
        let doc = SimDocument::new();
        let (redraws, redraw) = counter();
        let watcher = DebouncedWatcher::spawn(
            Arc::new(doc.clone()),
            DEFAULT_QUIET,
            |_| false,
            redraw,
        );
        tokio::task::yield_now().await;
        watcher.stop();
        tokio::task::yield_now().await;

        doc.insert_nodes(vec![SimNode::new("row:0")]);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(redraws.load(Ordering::SeqCst), 0);
    }
}
