// SPDX-License-Identifier: MIT

//! Workflow driver
//!
//! The per-page-load entry point. Reads the store exactly once, decides
//! between the idle menu and resumption, and owns the read-then-dispatch
//! sequence so nothing else touches the persisted record directly.

use std::sync::Arc;

use super::executor::{ExecutionEnd, StepExecutor};
use super::registry::WorkflowRegistry;
use super::state::WorkflowState;
use super::store::StateStore;
use super::workflow::PageContext;
use crate::ui::UserInterface;

/// What a page load resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No active workflow; the idle menu is showing.
    Idle,
    /// A workflow resumed and ran to one of its ends.
    Ran(ExecutionEnd),
}

pub struct Driver {
    registry: WorkflowRegistry,
    store: Arc<dyn StateStore>,
    ui: Arc<dyn UserInterface>,
    executor: StepExecutor,
}

impl Driver {
    pub fn new(
        registry: WorkflowRegistry,
        store: Arc<dyn StateStore>,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        let executor = StepExecutor::new(store.clone(), ui.clone());
        Self {
            registry,
            store,
            ui,
            executor,
        }
    }

    /// Entry point for each page load.
    pub async fn on_load(&self, page: &PageContext) -> LoadOutcome {
        // The store soft-fails malformed records itself; here they look
        // like "no active workflow".
        let state = match self.store.read() {
            Ok(state) => state,
            Err(err) => {
                log::error!("could not read persisted state: {}", err);
                None
            }
        };

        let Some(state) = state else {
            self.idle_menu(page).await;
            return LoadOutcome::Idle;
        };

        let Some(workflow) = self.registry.get(&state.action_id).await else {
            log::warn!(
                "persisted state names unknown workflow '{}'; discarding",
                state.action_id
            );
            if let Err(err) = self.store.clear() {
                log::error!("failed to clear workflow state: {}", err);
            }
            self.idle_menu(page).await;
            return LoadOutcome::Idle;
        };

        // Replay the carried log so the user sees an unbroken trace, and
        // keep the menu icon reachable while the workflow runs.
        for entry in &state.log_entries {
            self.ui.log(entry);
        }
        self.ui.set_menu_available(true);

        let end = self.executor.run(workflow, page, state).await;
        if end != ExecutionEnd::Suspended {
            self.idle_menu(page).await;
        }
        LoadOutcome::Ran(end)
    }

    /// Invoke a workflow from the idle menu. Starts from a fresh,
    /// uninitialized state.
    pub async fn invoke(&self, action_id: &str, page: &PageContext) -> Option<ExecutionEnd> {
        let workflow = self.registry.get(action_id).await?;
        self.ui.clear(false);
        self.ui.set_menu_available(true);
        let end = self
            .executor
            .run(workflow, page, WorkflowState::new(action_id))
            .await;
        if end != ExecutionEnd::Suspended {
            self.idle_menu(page).await;
        }
        Some(end)
    }

    async fn idle_menu(&self, page: &PageContext) {
        let items = self.registry.menu_items(page).await;
        self.ui.show_menu(items);
        self.ui.set_menu_available(true);
    }
}
