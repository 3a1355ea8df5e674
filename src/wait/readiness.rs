// SPDX-License-Identifier: MIT

//! One-shot readiness waits.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;

use crate::dom::{DocumentTree, Element};
use crate::gate::ChoiceGate;

#[derive(Debug, Error)]
pub enum WaitError {
    /// The document's mutation feed closed while the predicate was still
    /// unsatisfied. The page is gone; the waiter can never complete.
    #[error("document mutation feed closed")]
    FeedClosed,
}

/// Suspend until `predicate` yields an element.
///
/// The predicate is evaluated synchronously first; if unsatisfied, it is
/// re-evaluated on every mutation batch. The feed subscription is released
/// on first success (or when the returned future is dropped, e.g. by losing
/// a race).
pub async fn wait_for<F>(doc: &dyn DocumentTree, predicate: F) -> Result<Arc<dyn Element>, WaitError>
where
    F: Fn(&dyn DocumentTree) -> Option<Arc<dyn Element>>,
{
    if let Some(element) = predicate(doc) {
        return Ok(element);
    }

    let mut feed = doc.subscribe();

    // A mutation may have landed between the first check and the subscribe.
    if let Some(element) = predicate(doc) {
        return Ok(element);
    }

    loop {
        match feed.recv().await {
            // A lagged feed means batches were dropped; re-evaluating is
            // still correct, just possibly late.
            Ok(_) | Err(RecvError::Lagged(_)) => {
                if let Some(element) = predicate(doc) {
                    return Ok(element);
                }
            }
            Err(RecvError::Closed) => return Err(WaitError::FeedClosed),
        }
    }
}

/// Suspend until an element matching `selector` exists.
pub async fn wait_for_selector(
    doc: &dyn DocumentTree,
    selector: &str,
) -> Result<Arc<dyn Element>, WaitError> {
    wait_for(doc, |d| d.query(selector)).await
}

/// Outcome of racing a readiness wait against a human "skip" gate.
#[derive(Clone)]
pub enum SkipRace {
    /// The condition became true; the gate was cancelled.
    Ready(Arc<dyn Element>),
    /// The human skipped (or the gate was cancelled); the wait was dropped.
    Skipped,
}

/// First-completed-wins race between a readiness wait and a skip gate.
///
/// Whichever side completes first disposes the other: the losing wait's feed
/// subscription is dropped, the losing gate is cancelled (removing its
/// prompt artifacts).
pub async fn until_ready_or_skip<F>(
    doc: &dyn DocumentTree,
    predicate: F,
    skip: &ChoiceGate,
) -> Result<SkipRace, WaitError>
where
    F: Fn(&dyn DocumentTree) -> Option<Arc<dyn Element>>,
{
    tokio::select! {
        found = wait_for(doc, predicate) => {
            skip.cancel();
            Ok(SkipRace::Ready(found?))
        }
        _ = skip.wait() => Ok(SkipRace::Skipped),
    }
}
