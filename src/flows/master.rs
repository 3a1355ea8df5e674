// SPDX-License-Identifier: MIT

//! Shared helpers for the master-release edit form
//!
//! Both bundled workflows end up on the master create/edit page and fill the
//! same two fields: the release-id list and the key release. Committing goes
//! through `write_master_release`, which previews the changes, forces the
//! approval path by hiding the native submit control, and hands the control
//! back to the caller for the final persisted click.

use std::sync::Arc;

use crate::dom::{Element, NodeSpec};
use crate::engine::error::EngineError;
use crate::engine::workflow::PageContext;
use crate::ui::Choice;
use crate::wait::wait_for_selector;

pub(crate) const SUBMIT_INSTRUCTIONS: &str = "Use approval button in automator menu";

fn ensure_master_page(page: &PageContext) -> Result<(), EngineError> {
    if page.path().contains("/master/") {
        Ok(())
    } else {
        Err(EngineError::precondition(
            "Master release URL does not match expected format, cannot continue.",
        ))
    }
}

/// Replace the master's release list with `ids` (sorted ascending) and set
/// the key release. Without an explicit key the first listed id is used.
pub(crate) fn set_releases_for_master(
    page: &PageContext,
    ids: &[String],
    key_release: Option<&str>,
) -> Result<(), EngineError> {
    if ids.is_empty() {
        return Err(EngineError::precondition(
            "IDs must be provided for setting master release",
        ));
    }

    page.ui.log("Setting releases for master release");
    ensure_master_page(page)?;

    let releases = page
        .doc
        .query("master-releases")
        .ok_or_else(|| EngineError::precondition("Could not find releases text area"))?;

    let mut sorted = ids.to_vec();
    sorted.sort();
    releases.set_value(&sorted.join("\n"));

    let key_input = page
        .doc
        .query("master-main")
        .ok_or_else(|| EngineError::precondition("Could not find key releases input"))?;
    let key = key_release.unwrap_or_else(|| sorted[0].trim());
    key_input.set_value(key);

    Ok(())
}

/// Append `id` to the existing master's release list and make it the key
/// release.
pub(crate) fn add_release_to_master(page: &PageContext, id: &str) -> Result<(), EngineError> {
    page.ui.log("Adding release to existing master release");
    ensure_master_page(page)?;

    let releases = page
        .doc
        .query("master-releases")
        .ok_or_else(|| EngineError::precondition("Could not find releases text area"))?;
    let mut value = releases.value();
    value.push('\n');
    value.push_str(id);
    releases.set_value(&value);

    let key_input = page
        .doc
        .query("master-main")
        .ok_or_else(|| EngineError::precondition("Could not find key releases input"))?;
    key_input.set_value(id);

    Ok(())
}

/// Preview the pending master changes and wait for human approval. The
/// native submit control is hidden while the gate is open (so the only way
/// to commit is the approval button) and restored on either outcome. Returns
/// the submit control for the caller's persisted click; rejection surfaces
/// as a cancellation.
pub(crate) async fn write_master_release(
    page: &PageContext,
) -> Result<Arc<dyn Element>, EngineError> {
    let preview_button = page
        .doc
        .query("preview-button")
        .ok_or_else(|| EngineError::precondition("Could not find preview button"))?;
    preview_button.click();

    wait_for_selector(page.doc.as_ref(), "object-preview").await?;

    let submit = page
        .doc
        .query("save-master-button")
        .ok_or_else(|| EngineError::precondition("Could not find save button"))?;
    submit.set_hidden(true);
    page.doc
        .insert(NodeSpec::new("submit-instructions").text(SUBMIT_INSTRUCTIONS));

    let gate = page.ui.present_choices(
        "Please review preview and approve or cancel:",
        vec![
            Choice::new("Approve", "approve"),
            Choice::new("Cancel", "cancel"),
        ],
    );
    let choice = gate.wait().await;

    // Regardless of choice, restore the native submit affordance.
    if let Some(instructions) = page.doc.query("submit-instructions") {
        instructions.remove();
    }
    submit.set_hidden(false);

    if choice.as_deref() != Some("approve") {
        return Err(EngineError::cancelled("Submission cancelled by user"));
    }

    Ok(submit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::sim::{ClickEffect, SimDocument, SimNode};
    use crate::dom::DocumentTree;
    use crate::test_support::page_parts;
    use crate::ui::{Console, Responder};

    fn master_form() -> SimDocument {
        SimDocument::with_nodes(vec![
            SimNode::new("master-releases"),
            SimNode::new("master-main"),
            SimNode::new("preview-button").on_click(ClickEffect::Insert(vec![SimNode::new(
                "object-preview",
            )])),
            SimNode::new("save-master-button"),
        ])
    }

    #[test]
    fn set_releases_sorts_and_defaults_the_key() {
        let parts = page_parts(
            "https://www.discogs.com/master/create",
            master_form(),
            Console::new(),
        );
        let ids = vec!["9002".to_string(), "123".to_string(), "45".to_string()];
        set_releases_for_master(&parts.page, &ids, None).unwrap();

        // Plain string sort, matching how the ids are compared elsewhere.
        assert_eq!(
            parts.doc.query("master-releases").unwrap().value(),
            "123\n45\n9002"
        );
        assert_eq!(parts.doc.query("master-main").unwrap().value(), "123");
    }

    #[test]
    fn set_releases_honours_an_explicit_key() {
        let parts = page_parts(
            "https://www.discogs.com/master/create",
            master_form(),
            Console::new(),
        );
        let ids = vec!["100".to_string(), "200".to_string()];
        set_releases_for_master(&parts.page, &ids, Some("200")).unwrap();
        assert_eq!(parts.doc.query("master-main").unwrap().value(), "200");
    }

    #[test]
    fn set_releases_requires_ids_and_a_master_page() {
        let parts = page_parts(
            "https://www.discogs.com/master/create",
            master_form(),
            Console::new(),
        );
        assert!(matches!(
            set_releases_for_master(&parts.page, &[], None),
            Err(EngineError::Precondition(_))
        ));

        let elsewhere = page_parts(
            "https://www.discogs.com/artist/1-somebody",
            master_form(),
            Console::new(),
        );
        assert!(matches!(
            set_releases_for_master(&elsewhere.page, &["1".to_string()], None),
            Err(EngineError::Precondition(_))
        ));
    }

    #[test]
    fn add_release_appends_and_takes_the_key() {
        let parts = page_parts(
            "https://www.discogs.com/master/edit/42",
            master_form(),
            Console::new(),
        );
        parts
            .doc
            .query("master-releases")
            .unwrap()
            .set_value("111\n222");

        add_release_to_master(&parts.page, "333").unwrap();
        assert_eq!(
            parts.doc.query("master-releases").unwrap().value(),
            "111\n222\n333"
        );
        assert_eq!(parts.doc.query("master-main").unwrap().value(), "333");
    }

    struct Answer(&'static str);

    impl Responder for Answer {
        fn choose(&self, _message: &str, _choices: &[Choice]) -> Option<String> {
            Some(self.0.to_string())
        }

        fn input(&self, _message: &str) -> Option<Option<String>> {
            None
        }
    }

    #[tokio::test]
    async fn approval_returns_the_restored_submit_control() {
        let parts = page_parts(
            "https://www.discogs.com/master/create",
            master_form(),
            Console::with_responder(Arc::new(Answer("approve"))),
        );

        let submit = write_master_release(&parts.page).await.unwrap();
        assert_eq!(submit.selector(), "save-master-button");
        assert!(!submit.hidden());
        assert!(parts.doc.query("submit-instructions").is_none());
        assert!(parts.doc.query("object-preview").is_some());
    }

    #[tokio::test]
    async fn rejection_restores_the_form_and_cancels() {
        let parts = page_parts(
            "https://www.discogs.com/master/create",
            master_form(),
            Console::with_responder(Arc::new(Answer("cancel"))),
        );

        let err = write_master_release(&parts.page).await.unwrap_err();
        assert!(err.is_cancellation());
        assert!(!parts.doc.query("save-master-button").unwrap().hidden());
        assert!(parts.doc.query("submit-instructions").is_none());
    }
}
