// SPDX-License-Identifier: MIT

//! The resumable workflow engine
//!
//! `driver` is the per-page-load entry point; it reads the `store`, looks
//! the persisted action up in the `registry`, and hands the state to the
//! `executor`, which dispatches numbered steps with persist-then-act
//! ordering so side effects run exactly once across reloads.

pub mod driver;
pub mod error;
pub mod executor;
pub mod registry;
pub mod state;
pub mod store;
pub mod workflow;

pub use driver::{Driver, LoadOutcome};
pub use error::EngineError;
pub use executor::{ExecutionEnd, StepExecutor};
pub use registry::WorkflowRegistry;
pub use state::{ActionState, WorkflowState};
pub use store::{FileStore, MemoryStore, StateStore, StoreError};
pub use workflow::{PageContext, StepOutcome, Workflow};
