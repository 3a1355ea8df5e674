// SPDX-License-Identifier: MIT

//! Registry of available workflows, consulted by the driver to build the
//! idle menu and to resolve a persisted `action_id` back to its definition.
//! Menu order is registration order.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::workflow::{PageContext, Workflow};
use crate::ui::MenuItem;

#[derive(Clone)]
pub struct WorkflowRegistry {
    workflows: Arc<RwLock<Vec<Arc<dyn Workflow>>>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self {
            workflows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn register(&self, workflow: Arc<dyn Workflow>) {
        let mut workflows = self.workflows.write().await;
        if let Some(existing) = workflows.iter_mut().find(|w| w.id() == workflow.id()) {
            *existing = workflow;
        } else {
            workflows.push(workflow);
        }
    }

    pub async fn get(&self, action_id: &str) -> Option<Arc<dyn Workflow>> {
        let workflows = self.workflows.read().await;
        workflows.iter().find(|w| w.id() == action_id).cloned()
    }

    /// Menu entries for the workflows enabled on the current page, in
    /// registration order.
    pub async fn menu_items(&self, page: &PageContext) -> Vec<MenuItem> {
        let workflows = self.workflows.read().await;
        workflows
            .iter()
            .filter(|w| w.is_enabled(page))
            .map(|w| MenuItem {
                id: w.id().to_string(),
                title: w.title().to_string(),
                icon: w.icon().to_string(),
            })
            .collect()
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
