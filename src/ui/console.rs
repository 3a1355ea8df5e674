// SPDX-License-Identifier: MIT

//! In-memory log/menu surface.

use std::sync::{Arc, Mutex};

use crate::gate::{ChoiceGate, InputGate};

use super::{Choice, MenuItem, Responder, UserInterface};

const CLEAR_STATE: &str = "clear-state";

struct Entry {
    id: u64,
    text: String,
    warning: bool,
}

/// A choice gate currently rendered on the surface.
#[derive(Clone)]
pub struct OpenChoice {
    pub message: String,
    pub choices: Vec<Choice>,
    pub gate: ChoiceGate,
}

/// An input gate currently rendered on the surface.
#[derive(Clone)]
pub struct OpenInput {
    pub message: String,
    pub gate: InputGate,
}

#[derive(Default)]
struct ConsoleState {
    entries: Vec<Entry>,
    next_id: u64,
    menu: Vec<MenuItem>,
    menu_available: bool,
    open_choices: Vec<(u64, OpenChoice)>,
    open_inputs: Vec<(u64, OpenInput)>,
}

impl ConsoleState {
    fn push(&mut self, text: &str, warning: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            text: text.to_string(),
            warning,
        });
        id
    }

    fn remove_entries(&mut self, ids: &[u64]) {
        self.entries.retain(|e| !ids.contains(&e.id));
    }
}

/// In-memory implementation of the human-facing surface. Cloning yields a
/// handle to the same surface.
#[derive(Clone)]
pub struct Console {
    state: Arc<Mutex<ConsoleState>>,
    responder: Option<Arc<dyn Responder>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ConsoleState::default())),
            responder: None,
        }
    }

    /// Attach scripted answers; every presented gate is offered to the
    /// responder first.
    pub fn with_responder(responder: Arc<dyn Responder>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConsoleState::default())),
            responder: Some(responder),
        }
    }

    /// Choice gates currently open, oldest first.
    pub fn open_choices(&self) -> Vec<OpenChoice> {
        let state = self.state.lock().unwrap();
        state.open_choices.iter().map(|(_, g)| g.clone()).collect()
    }

    /// Input gates currently open, oldest first.
    pub fn open_inputs(&self) -> Vec<OpenInput> {
        let state = self.state.lock().unwrap();
        state.open_inputs.iter().map(|(_, g)| g.clone()).collect()
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        self.state.lock().unwrap().menu.clone()
    }

    pub fn menu_available(&self) -> bool {
        self.state.lock().unwrap().menu_available
    }

    /// Warning-icon entries, for assertions.
    pub fn warnings(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .iter()
            .filter(|e| e.warning)
            .map(|e| e.text.clone())
            .collect()
    }

    fn present(&self, message: &str, choices: Vec<Choice>, warning: bool) -> ChoiceGate {
        let (message_id, buttons_id) = {
            let mut state = self.state.lock().unwrap();
            let message_id = state.push(message, warning);
            let labels = choices
                .iter()
                .map(|c| format!("[{}]", c.label))
                .collect::<Vec<_>>()
                .join(" ");
            let buttons_id = state.push(&labels, false);
            (message_id, buttons_id)
        };

        let cleanup_state = Arc::clone(&self.state);
        let gate = ChoiceGate::new(move || {
            let mut state = cleanup_state.lock().unwrap();
            state.remove_entries(&[message_id, buttons_id]);
            state.open_choices.retain(|(id, _)| *id != message_id);
        });

        let open = OpenChoice {
            message: message.to_string(),
            choices: choices.clone(),
            gate: gate.clone(),
        };
        self.state
            .lock()
            .unwrap()
            .open_choices
            .push((message_id, open));

        if let Some(responder) = &self.responder {
            if let Some(value) = responder.choose(message, &choices) {
                gate.resolve(&value);
            }
        }
        gate
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInterface for Console {
    fn log(&self, message: &str) {
        self.state.lock().unwrap().push(message, false);
    }

    fn warn(&self, message: &str) {
        self.state.lock().unwrap().push(message, true);
    }

    fn entries(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.entries.iter().map(|e| e.text.clone()).collect()
    }

    fn clear(&self, leave_log: bool) {
        // Settle open gates outside the lock; their cleanup hooks re-enter.
        let (choices, inputs) = {
            let state = self.state.lock().unwrap();
            (
                state
                    .open_choices
                    .iter()
                    .map(|(_, g)| g.gate.clone())
                    .collect::<Vec<_>>(),
                state
                    .open_inputs
                    .iter()
                    .map(|(_, g)| g.gate.clone())
                    .collect::<Vec<_>>(),
            )
        };
        for gate in choices {
            gate.cancel();
        }
        for gate in inputs {
            gate.cancel();
        }

        let mut state = self.state.lock().unwrap();
        state.menu.clear();
        state.menu_available = false;
        if !leave_log {
            state.entries.clear();
        }
    }

    fn show_menu(&self, items: Vec<MenuItem>) {
        self.state.lock().unwrap().menu = items;
    }

    fn set_menu_available(&self, available: bool) {
        self.state.lock().unwrap().menu_available = available;
    }

    fn present_choices(&self, message: &str, choices: Vec<Choice>) -> ChoiceGate {
        self.present(message, choices, false)
    }

    fn present_failure(&self, message: &str) -> ChoiceGate {
        self.present(
            message,
            vec![Choice::new("Clear State", CLEAR_STATE)],
            true,
        )
    }

    fn present_input(&self, message: &str) -> InputGate {
        let (message_id, field_id) = {
            let mut state = self.state.lock().unwrap();
            let message_id = state.push(message, false);
            let field_id = state.push("[input] [OK] [Cancel]", false);
            (message_id, field_id)
        };

        let cleanup_state = Arc::clone(&self.state);
        let gate = InputGate::new(move || {
            let mut state = cleanup_state.lock().unwrap();
            state.remove_entries(&[message_id, field_id]);
            state.open_inputs.retain(|(id, _)| *id != message_id);
        });

        let open = OpenInput {
            message: message.to_string(),
            gate: gate.clone(),
        };
        self.state
            .lock()
            .unwrap()
            .open_inputs
            .push((message_id, open));

        if let Some(responder) = &self.responder {
            match responder.input(message) {
                Some(Some(text)) => gate.submit(&text),
                Some(None) => gate.cancel(),
                None => {}
            }
        }
        gate
    }
}
