// SPDX-License-Identifier: MIT

//! Human-facing surface
//!
//! A transient message log with optional choice buttons or a text input,
//! plus a persistent menu of available workflows. The engine talks to it
//! through the `UserInterface` trait; the bundled `Console` keeps everything
//! in memory, which is all the simulation and the tests need.

mod console;

pub use console::{Console, OpenChoice, OpenInput};

use crate::gate::{ChoiceGate, InputGate};

/// One selectable answer of a choice gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Menu entry for one registered workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub icon: String,
}

/// Scripted answers for gates, used by non-interactive frontends.
///
/// Returning `None` leaves the gate pending (a human or a racing waiter will
/// settle it later).
pub trait Responder: Send + Sync {
    fn choose(&self, message: &str, choices: &[Choice]) -> Option<String>;

    /// `Some(Some(text))` submits, `Some(None)` cancels, `None` leaves the
    /// gate pending.
    fn input(&self, message: &str) -> Option<Option<String>>;
}

/// The surface the engine renders to.
pub trait UserInterface: Send + Sync {
    /// Append a plain message to the log view.
    fn log(&self, message: &str);

    /// Append a warning-icon message to the log view.
    fn warn(&self, message: &str);

    /// Current log entries, in order. These are what gets persisted in
    /// `WorkflowState::log_entries` and replayed after a reload.
    fn entries(&self) -> Vec<String>;

    /// Remove rendered artifacts; keeps the log when `leave_log` is set.
    fn clear(&self, leave_log: bool);

    /// Render the idle menu.
    fn show_menu(&self, items: Vec<MenuItem>);

    /// Keep the menu icon reachable while a workflow runs.
    fn set_menu_available(&self, available: bool);

    /// Render a prompt with choice buttons. Settling the gate removes the
    /// prompt artifacts.
    fn present_choices(&self, message: &str, choices: Vec<Choice>) -> ChoiceGate;

    /// Render a failure prompt whose only way out is "Clear State".
    fn present_failure(&self, message: &str) -> ChoiceGate;

    /// Render a prompt with a free-text field. Settling the gate removes the
    /// prompt artifacts.
    fn present_input(&self, message: &str) -> InputGate;
}
