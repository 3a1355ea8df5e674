// SPDX-License-Identifier: MIT

//! Persisted workflow state
//!
//! One `WorkflowState` is the unit of persisted progress: which workflow
//! owns it, which step comes next, the accumulated payload, and the log
//! entries replayed for continuity after a reload. The wire format is the
//! single JSON record the store holds:
//! `{"actionId": ..., "actionState": {"stepId": ..., <payload>}, "logEntries": [...]}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::EngineError;

/// Step cursor plus workflow-specific accumulated data. The payload is
/// append-only in practice; no two workflows share a payload shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionState {
    /// `None` denotes "not yet initialized"; otherwise a zero-based index
    /// into the owning workflow's step sequence.
    #[serde(rename = "stepId", skip_serializing_if = "Option::is_none")]
    pub step_id: Option<u32>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ActionState {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.payload.insert(field.to_string(), value);
    }

    pub fn set_str(&mut self, field: &str, value: impl Into<String>) {
        self.set(field, Value::String(value.into()));
    }

    /// Required string field; absence is fatal for the step.
    pub fn require_str(&self, field: &str) -> Result<&str, EngineError> {
        self.get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::missing_payload(field))
    }

    /// Required unsigned-integer field; absence is fatal for the step.
    pub fn require_u64(&self, field: &str) -> Result<u64, EngineError> {
        self.get(field)
            .and_then(Value::as_u64)
            .ok_or_else(|| EngineError::missing_payload(field))
    }

    /// Required array-of-string field; absence is fatal for the step.
    pub fn require_str_list(&self, field: &str) -> Result<Vec<String>, EngineError> {
        self.get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .ok_or_else(|| EngineError::missing_payload(field))
    }
}

/// The persisted record. At most one exists in the store at any time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    /// Which workflow definition owns this state.
    pub action_id: String,

    pub action_state: ActionState,

    /// Human-readable trace shown to the user, carried across navigations.
    #[serde(default)]
    pub log_entries: Vec<String>,
}

impl WorkflowState {
    /// Fresh, uninitialized state for a newly invoked workflow.
    pub fn new(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            action_state: ActionState::default(),
            log_entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_format_flattens_payload_into_action_state() {
        let mut state = WorkflowState::new("create-master-release");
        state.action_state.step_id = Some(1);
        state
            .action_state
            .set("selectedReleaseIds", json!([123, 45]));
        state.log_entries.push("Selected 2 releases".to_string());

        let encoded = serde_json::to_value(&state).unwrap();
        assert_eq!(
            encoded,
            json!({
                "actionId": "create-master-release",
                "actionState": {"stepId": 1, "selectedReleaseIds": [123, 45]},
                "logEntries": ["Selected 2 releases"],
            })
        );

        let decoded: WorkflowState = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn uninitialized_state_omits_step_id() {
        let state = WorkflowState::new("duplicate-as-flac");
        let encoded = serde_json::to_value(&state).unwrap();
        assert_eq!(
            encoded,
            json!({"actionId": "duplicate-as-flac", "actionState": {}, "logEntries": []})
        );

        let decoded: WorkflowState = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.action_state.step_id, None);
    }

    #[test]
    fn required_fields_surface_missing_payload() {
        let mut state = ActionState::default();
        state.set_str("name", "Album \u{2014} FLAC");
        state.set("ids", json!(["1", "2"]));
        state.set("count", json!(7));

        assert_eq!(state.require_str("name").unwrap(), "Album \u{2014} FLAC");
        assert_eq!(state.require_u64("count").unwrap(), 7);
        assert_eq!(
            state.require_str_list("ids").unwrap(),
            vec!["1".to_string(), "2".to_string()]
        );

        let err = state.require_str("absent").unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingPayload { ref field } if field == "absent"
        ));
    }
}
