// SPDX-License-Identifier: MIT

//! Typed error handling for the workflow engine
//!
//! Steps never panic for expected failure modes; they return an
//! `EngineError` and the executor routes it through the fail path (warning
//! entry plus a "Clear State" gate).

use thiserror::Error;

use super::store::StoreError;
use crate::wait::WaitError;

/// Top-level error type for the workflow engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The current page does not match what the step expects (wrong URL
    /// shape, missing control). Fatal for the step, never retried.
    #[error("{0}")]
    Precondition(String),

    /// Persisted step index outside the workflow's defined range. Indicates
    /// stale or corrupt persisted state, never auto-corrected.
    #[error("State {step} is not supported for '{action}'")]
    UnsupportedStep { action: String, step: u32 },

    /// A payload field required by this step was never populated. A
    /// configuration error, not a retryable condition.
    #[error("Required payload field '{field}' is missing")]
    MissingPayload { field: String },

    /// The human rejected or cancelled at a gate. Travels the fail path for
    /// consistent cleanup but is phrased as cancellation, not as an error.
    #[error("{0}")]
    Cancelled(String),

    /// State persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A readiness wait can never complete.
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl EngineError {
    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a cancellation
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled(message.into())
    }

    /// Create a missing-payload error
    pub fn missing_payload(field: impl Into<String>) -> Self {
        Self::MissingPayload {
            field: field.into(),
        }
    }

    /// Whether this error is a user cancellation rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
