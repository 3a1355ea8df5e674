// SPDX-License-Identifier: MIT

//! Human gates
//!
//! A gate is a deferred value settled by the human supervising the workflow.
//! It has exactly three observable states: pending, resolved with a value, or
//! cancelled. Settling a gate runs its cleanup hook (which removes the
//! rendered prompt artifacts) exactly once. Cancellation is not an error;
//! callers see it as an absent value.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

/// Observable state of a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStatus<T> {
    Pending,
    Resolved(T),
    Cancelled,
}

struct GateState<T> {
    status: GateStatus<T>,
    on_settle: Option<Box<dyn FnOnce() + Send>>,
}

struct GateInner<T> {
    state: Mutex<GateState<T>>,
    notify: Notify,
}

/// Shared deferred with explicit `resolve`/`cancel` operations.
///
/// Cloning yields another handle to the same gate; any clone may settle it,
/// any clone may await it.
pub struct Gate<T: Clone> {
    inner: Arc<GateInner<T>>,
}

impl<T: Clone> Clone for Gate<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + PartialEq> Gate<T> {
    pub fn new(on_settle: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(GateInner {
                state: Mutex::new(GateState {
                    status: GateStatus::Pending,
                    on_settle: Some(Box::new(on_settle)),
                }),
                notify: Notify::new(),
            }),
        }
    }

    pub fn status(&self) -> GateStatus<T> {
        self.inner.state.lock().unwrap().status.clone()
    }

    /// Settle with a value. No-op if already settled.
    pub fn resolve(&self, value: T) {
        self.settle(GateStatus::Resolved(value));
    }

    /// Settle as cancelled. No-op if already settled.
    pub fn cancel(&self) {
        self.settle(GateStatus::Cancelled);
    }

    /// Wait until the gate settles.
    pub async fn wait(&self) -> GateStatus<T> {
        loop {
            let notified = self.inner.notify.notified();
            {
                let state = self.inner.state.lock().unwrap();
                if state.status != GateStatus::Pending {
                    return state.status.clone();
                }
            }
            notified.await;
        }
    }

    fn settle(&self, status: GateStatus<T>) {
        let cleanup = {
            let mut state = self.inner.state.lock().unwrap();
            if state.status != GateStatus::Pending {
                return;
            }
            state.status = status;
            state.on_settle.take()
        };
        if let Some(cleanup) = cleanup {
            cleanup();
        }
        self.inner.notify.notify_waiters();
    }
}

/// A gate presenting a fixed set of labelled choices.
#[derive(Clone)]
pub struct ChoiceGate {
    gate: Gate<String>,
}

impl ChoiceGate {
    pub fn new(on_settle: impl FnOnce() + Send + 'static) -> Self {
        Self {
            gate: Gate::new(on_settle),
        }
    }

    /// Resolve with the chosen value. An empty value never closes the gate:
    /// it is logged and ignored, guarding against accidental empty triggers.
    pub fn resolve(&self, value: &str) {
        if value.is_empty() {
            log::warn!("choice gate resolved with empty value; ignoring");
            return;
        }
        self.gate.resolve(value.to_string());
    }

    /// Cancel the gate, e.g. because a racing waiter won.
    pub fn cancel(&self) {
        self.gate.cancel();
    }

    pub fn status(&self) -> GateStatus<String> {
        self.gate.status()
    }

    /// Wait for the gate to settle. Cancellation yields `None`.
    pub async fn wait(&self) -> Option<String> {
        match self.gate.wait().await {
            GateStatus::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// A gate presenting a free-text field.
#[derive(Clone)]
pub struct InputGate {
    gate: Gate<String>,
}

impl InputGate {
    pub fn new(on_settle: impl FnOnce() + Send + 'static) -> Self {
        Self {
            gate: Gate::new(on_settle),
        }
    }

    /// Submit the entered text. Empty submissions settle the gate; callers
    /// decide whether an empty string is acceptable.
    pub fn submit(&self, value: &str) {
        self.gate.resolve(value.to_string());
    }

    pub fn cancel(&self) {
        self.gate.cancel();
    }

    pub fn status(&self) -> GateStatus<String> {
        self.gate.status()
    }

    /// Wait for the gate to settle. Cancellation yields `None`.
    pub async fn wait(&self) -> Option<String> {
        match self.gate.wait().await {
            GateStatus::Resolved(value) => Some(value),
            _ => None,
        }
    }
}
