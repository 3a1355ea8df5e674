// SPDX-License-Identifier: MIT

//! The workflow abstraction
//!
//! A workflow is a named, ordered sequence of steps indexed by `step_id`.
//! Initialization is an explicit first phase: it validates preconditions
//! against the current page, seeds the payload, and is immediately followed
//! (same execution turn) by step 0; no intermediate state is ever
//! persisted for a freshly initialized workflow.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::error::EngineError;
use super::state::ActionState;
use crate::dom::{DocumentTree, Element, Navigator};
use crate::ui::UserInterface;

/// Everything a step may touch on the current page.
#[derive(Clone)]
pub struct PageContext {
    pub url: Url,
    pub doc: Arc<dyn DocumentTree>,
    pub ui: Arc<dyn UserInterface>,
    pub nav: Arc<dyn Navigator>,
}

impl PageContext {
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// How a completed step hands control back to the executor.
#[derive(Debug)]
pub enum StepOutcome {
    /// Advance, persist, then navigate. Execution ends here; resumption
    /// happens on the next page load.
    Goto(String),

    /// Advance, persist, then click the control (which typically submits a
    /// form and navigates). Execution ends here.
    Submit(Arc<dyn Element>),

    /// Advance, persist, and run the next step in the same turn. Used where
    /// no navigation separates two steps.
    Continue,

    /// Terminal step: the store is cleared and control returns to the idle
    /// menu, optionally keeping the log on screen.
    Finished { leave_log: bool },
}

/// One registered workflow definition.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Identifier persisted in `WorkflowState::action_id`.
    fn id(&self) -> &str;

    /// Menu label.
    fn title(&self) -> &str;

    /// Menu icon name.
    fn icon(&self) -> &str;

    /// Whether the menu offers this workflow on the current page.
    fn is_enabled(&self, page: &PageContext) -> bool;

    /// Validate preconditions and seed the payload. On error nothing has
    /// been persisted, so the next invocation starts fresh.
    async fn initialize(
        &self,
        page: &PageContext,
        state: &mut ActionState,
    ) -> Result<(), EngineError>;

    /// Execute the numbered step. An index outside the defined range must
    /// yield `EngineError::UnsupportedStep`.
    async fn step(
        &self,
        step: u32,
        page: &PageContext,
        state: &mut ActionState,
    ) -> Result<StepOutcome, EngineError>;
}
