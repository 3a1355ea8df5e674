// SPDX-License-Identifier: MIT

//! Step executor
//!
//! Dispatches a resumed or freshly initialized `WorkflowState` to the
//! numbered steps of its workflow. The ordering that makes side effects
//! exactly-once across reloads lives here: the advanced `step_id` is
//! persisted before any navigation or navigation-triggering click, so a
//! reload racing the mutation resumes after the step that mutated, never
//! on it.

use std::sync::Arc;

use super::error::EngineError;
use super::state::WorkflowState;
use super::store::StateStore;
use super::workflow::{PageContext, StepOutcome, Workflow};
use crate::ui::UserInterface;

/// How one execution turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionEnd {
    /// Advanced state persisted; continuation happens on the next page load.
    Suspended,
    /// Terminal step ran; the store is empty.
    Finished,
    /// The fail path ran and was acknowledged; the store is empty.
    Failed,
}

pub struct StepExecutor {
    store: Arc<dyn StateStore>,
    ui: Arc<dyn UserInterface>,
}

impl StepExecutor {
    pub fn new(store: Arc<dyn StateStore>, ui: Arc<dyn UserInterface>) -> Self {
        Self { store, ui }
    }

    /// Run the workflow from its persisted position until it suspends,
    /// finishes, or fails. Uninitialized state goes through `initialize`
    /// and then step 0 in the same turn, with no intermediate persisted
    /// record.
    pub async fn run(
        &self,
        workflow: Arc<dyn Workflow>,
        page: &PageContext,
        mut state: WorkflowState,
    ) -> ExecutionEnd {
        let mut step = match state.action_state.step_id {
            Some(step) => step,
            None => {
                log::info!("initializing workflow '{}'", workflow.id());
                if let Err(err) = workflow.initialize(page, &mut state.action_state).await {
                    return self.fail(err).await;
                }
                0
            }
        };

        loop {
            log::info!("workflow '{}': running step {}", workflow.id(), step);
            let outcome = match workflow.step(step, page, &mut state.action_state).await {
                Ok(outcome) => outcome,
                Err(err) => return self.fail(err).await,
            };

            match outcome {
                StepOutcome::Continue => {
                    if let Err(err) = self.advance(&mut state, step + 1) {
                        return self.fail(err).await;
                    }
                    step += 1;
                }
                StepOutcome::Goto(url) => {
                    if let Err(err) = self.advance(&mut state, step + 1) {
                        return self.fail(err).await;
                    }
                    page.nav.goto(&url);
                    return ExecutionEnd::Suspended;
                }
                StepOutcome::Submit(control) => {
                    if let Err(err) = self.advance(&mut state, step + 1) {
                        return self.fail(err).await;
                    }
                    control.click();
                    return ExecutionEnd::Suspended;
                }
                StepOutcome::Finished { leave_log } => {
                    if let Err(err) = self.store.clear() {
                        return self.fail(err.into()).await;
                    }
                    log::info!("workflow '{}' finished", workflow.id());
                    self.ui.clear(leave_log);
                    return ExecutionEnd::Finished;
                }
            }
        }
    }

    /// Persist the advanced step cursor plus a snapshot of the log, so the
    /// next load replays what the user has already seen.
    fn advance(&self, state: &mut WorkflowState, next_step: u32) -> Result<(), EngineError> {
        state.action_state.step_id = Some(next_step);
        state.log_entries = self.ui.entries();
        self.store.write(state)?;
        Ok(())
    }

    /// The single failure path. Opens a gate whose only way out is
    /// "Clear State"; acknowledgment empties the store. Cancellations travel
    /// the same path, phrased by the message they carry.
    async fn fail(&self, err: EngineError) -> ExecutionEnd {
        let message = err.to_string();
        if err.is_cancellation() {
            log::info!("workflow cancelled: {}", message);
        } else {
            log::error!("workflow failed: {}", message);
        }

        self.ui.set_menu_available(false);
        let gate = self.ui.present_failure(&message);
        gate.wait().await;

        if let Err(clear_err) = self.store.clear() {
            log::error!("failed to clear workflow state: {}", clear_err);
        }
        self.ui.clear(true);
        ExecutionEnd::Failed
    }
}
