// SPDX-License-Identifier: MIT

//! Duplicate-as-digital workflow
//!
//! Copies an existing release to a draft, retargets the draft to a digital
//! file format (FLAC or WAV), submits it after approval, and finally files
//! the new release under the right master release, creating one if the
//! original had none. One handler parameterized by format backs both menu
//! entries.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::master::{add_release_to_master, set_releases_for_master, write_master_release};
use crate::dom::NodeSpec;
use crate::engine::error::EngineError;
use crate::engine::state::ActionState;
use crate::engine::workflow::{PageContext, StepOutcome, Workflow};
use crate::ui::Choice;
use crate::wait::{until_ready_or_skip, wait_for_selector};

pub const DUPLICATE_AS_FLAC: &str = "duplicate-as-flac";
pub const DUPLICATE_AS_WAV: &str = "duplicate-as-wav";

const MASTER_ID: &str = "masterId";
const ORIGINAL_ID: &str = "originalId";
const EXPECTED_DRAFT_NAME: &str = "expectedDraftName";
const NEW_ID: &str = "newId";

static RELEASE_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/release/\d+(-[^/]+)+$").unwrap());
static RELEASE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/release/(\d+)-?").unwrap());
static MASTER_ID_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"/master/(\d+)-").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn release_id_from_url(page: &PageContext) -> Result<String, EngineError> {
    RELEASE_ID
        .captures(page.url.as_str())
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| {
            EngineError::precondition(
                "Release page URL does not match expected format, cannot extract release ID",
            )
        })
}

fn resolve_href(page: &PageContext, href: &str) -> Result<String, EngineError> {
    Ok(page.url.join(href)?.to_string())
}

pub struct DuplicateAsDigital {
    action_id: &'static str,
    title: &'static str,
    /// Lowercase format name, used in log text and submission notes.
    format_label: &'static str,
    /// Uppercase format code, as the edit form's file-type options name it.
    format_code: &'static str,
}

impl DuplicateAsDigital {
    pub fn flac() -> Self {
        Self {
            action_id: DUPLICATE_AS_FLAC,
            title: "Duplicate As FLAC",
            format_label: "flac",
            format_code: "FLAC",
        }
    }

    pub fn wav() -> Self {
        Self {
            action_id: DUPLICATE_AS_WAV,
            title: "Duplicate As WAV",
            format_label: "wav",
            format_code: "WAV",
        }
    }

    /// The long edit-form step: wait for the form, tidy the draft, retarget
    /// the format, collect the reference URL, preview, and hand back the
    /// submit control after approval.
    async fn edit_draft(&self, page: &PageContext) -> Result<StepOutcome, EngineError> {
        page.ui.log("Waiting for edit page to load...");

        if !page.path().contains("/release/edit/") {
            return Err(EngineError::precondition(
                "Current state expects to be on draft editing page, which is false.",
            ));
        }

        // The edit form renders behind a loading screen.
        wait_for_selector(page.doc.as_ref(), "subform-table").await?;

        // Image uploading cannot be automated; wait for the human to upload
        // one, with a skip for releases that need none.
        let skip = page.ui.present_choices(
            "Waiting for image to be uploaded... Click to skip.",
            vec![Choice::new("Skip", "skip")],
        );
        until_ready_or_skip(page.doc.as_ref(), |d| d.query("image-preview"), &skip).await?;

        // Different SKUs should carry different barcodes, so none of the
        // original's barcode entries belong on the duplicate.
        page.ui.log("Removing barcodes...");
        for entry in page.doc.query_all("barcode:") {
            if entry.value() == "barcode" {
                entry.remove();
            }
        }

        page.ui.log("Changing format...");
        let formats = page.doc.query_all("format-type:");
        if formats.is_empty() {
            return Err(EngineError::precondition("Could not find format elements"));
        }
        if formats.len() > 1 {
            // TODO: support duplicating split releases
            return Err(EngineError::precondition(
                "Too many formats to automate safely.",
            ));
        }
        if formats[0].value() != "File" {
            // TODO: support duplicating CD/vinyl releases
            return Err(EngineError::precondition(
                "Release is not a file. Cannot safely automate.",
            ));
        }

        for file_type in page.doc.query_all("file-type:") {
            if file_type.value() == "on" {
                file_type.set_value("");
            }
        }
        let desired = page
            .doc
            .query(&format!("file-type:{}", self.format_code))
            .ok_or_else(|| {
                EngineError::precondition(format!(
                    "Could not find {} file type",
                    self.format_code
                ))
            })?;
        desired.set_value("on");

        let free_text = page
            .doc
            .query("format-free-text")
            .ok_or_else(|| EngineError::precondition("Could not find free text field"))?;
        free_text.set_value("");

        // Single-track releases get the Single description.
        if page.doc.query_all("track:").len() == 1 {
            if let Some(single) = page.doc.query("description:Single") {
                if single.value() != "on" {
                    single.set_value("on");
                }
            }
        }

        page.ui.log("Setting submission notes...");
        let notes = page
            .doc
            .query("submission-notes")
            .ok_or_else(|| EngineError::precondition("Could not find Submission Notes"))?;
        let reference_url = match page.ui.present_input("Input reference URL:").wait().await {
            Some(url) if !url.is_empty() => url,
            _ => return Err(EngineError::cancelled("Reference URL not provided")),
        };
        let notes_value = format!("Adding {} version: {}", self.format_label, reference_url);
        notes.set_value(&notes_value);

        let preview_button = page
            .doc
            .query("release-preview-button")
            .ok_or_else(|| EngineError::precondition("Could not find preview/submit button"))?;
        preview_button.click();

        page.ui.log("Waiting for preview...");
        wait_for_selector(page.doc.as_ref(), "subform-preview").await?;

        page.ui.log("Running preliminary check...");
        let format_ok = page
            .doc
            .query("preview-format")
            .map(|el| el.text().contains(&format!("File, {}", self.format_code)))
            .unwrap_or(false);
        if !format_ok {
            return Err(EngineError::precondition("Format failed preliminary check"));
        }
        let notes_ok = page
            .doc
            .query("preview-submission-notes")
            .map(|el| el.text() == notes_value)
            .unwrap_or(false);
        if !notes_ok {
            return Err(EngineError::precondition(
                "Submission notes failed preliminary check",
            ));
        }

        // Force the approval path: the native submit disappears until the
        // gate settles, either way.
        let submit = page
            .doc
            .query("subform-submit-button")
            .ok_or_else(|| EngineError::precondition("Could not find submit button"))?;
        submit.set_hidden(true);
        page.doc.insert(
            NodeSpec::new("submit-instructions").text(super::master::SUBMIT_INSTRUCTIONS),
        );

        let gate = page.ui.present_choices(
            "Please review preview and approve or reject:",
            vec![
                Choice::new("Approve", "approve"),
                Choice::new("Reject", "reject"),
            ],
        );
        let choice = gate.wait().await;

        if let Some(instructions) = page.doc.query("submit-instructions") {
            instructions.remove();
        }
        submit.set_hidden(false);

        if choice.as_deref() != Some("approve") {
            return Err(EngineError::cancelled("Submission cancelled by user."));
        }

        page.ui.log("Submitting release...");
        Ok(StepOutcome::Submit(submit))
    }
}

#[async_trait]
impl Workflow for DuplicateAsDigital {
    fn id(&self) -> &str {
        self.action_id
    }

    fn title(&self) -> &str {
        self.title
    }

    fn icon(&self) -> &str {
        "copy"
    }

    fn is_enabled(&self, page: &PageContext) -> bool {
        if !RELEASE_PAGE.is_match(page.url.as_str()) {
            return false;
        }
        // Drafts must not be duplicated again.
        match page.doc.query("release-actions") {
            Some(actions) => !actions.text().contains("Draft"),
            None => true,
        }
    }

    async fn initialize(
        &self,
        page: &PageContext,
        state: &mut ActionState,
    ) -> Result<(), EngineError> {
        // The original release may already belong to a master release.
        if let Some(master_link) = page.doc.query("master-link") {
            let master_id = master_link
                .attr("href")
                .and_then(|href| MASTER_ID_HREF.captures(&href).map(|c| c[1].to_string()));
            if let Some(master_id) = master_id {
                state.set_str(MASTER_ID, master_id);
            }
        }

        if page.doc.query("edit-release-link").is_none() {
            return Err(EngineError::precondition(
                "Edit release link cannot be found",
            ));
        }

        state.set_str(ORIGINAL_ID, release_id_from_url(page)?);

        // The draft will be listed as "<title> <em dash> <labels>", with each
        // label's trailing catalog number stripped.
        let title = page.doc.query("title");
        let label_info = page.doc.query("label-info");
        let (Some(title), Some(label_info)) = (title, label_info) else {
            return Err(EngineError::precondition(
                "Could not find title or label elements, cannot extract expected draft name",
            ));
        };
        let labels = label_info
            .text()
            .split(',')
            .map(|entry| entry.split('\u{2013}').next().unwrap_or("").trim().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        state.set_str(
            EXPECTED_DRAFT_NAME,
            format!("{} \u{2014} {}", title.text(), labels),
        );

        Ok(())
    }

    async fn step(
        &self,
        step: u32,
        page: &PageContext,
        state: &mut ActionState,
    ) -> Result<StepOutcome, EngineError> {
        match step {
            // Open the release's edit history.
            0 => {
                let edit_link = page.doc.query("edit-release-link").ok_or_else(|| {
                    EngineError::precondition("Edit release link cannot be found")
                })?;
                Ok(StepOutcome::Submit(edit_link))
            }

            // History page: copy the release to a draft.
            1 => {
                page.ui.log("Copying release to draft...");

                if !page.path().contains("/history") {
                    return Err(EngineError::precondition(
                        "Current page does not align with current state",
                    ));
                }

                let copy_link = page
                    .doc
                    .query("copy-to-draft-link")
                    .and_then(|link| link.attr("href"))
                    .ok_or_else(|| {
                        EngineError::precondition("Copy to draft link cannot be found")
                    })?;
                Ok(StepOutcome::Goto(resolve_href(page, &copy_link)?))
            }

            // Drafts listing: verify the fresh draft is ours, open it.
            2 => {
                page.ui.log("Redirecting to draft edit page...");

                if !page.path().ends_with("/users/drafts") {
                    return Err(EngineError::precondition(
                        "Current state expects to be on drafts page, which is false.",
                    ));
                }

                let title = page
                    .doc
                    .query("draft-row:0:title")
                    .ok_or_else(|| EngineError::precondition("Could not find draft row item"))?;
                let found = WHITESPACE.replace_all(&title.text(), " ").trim().to_string();
                let expected = state.require_str(EXPECTED_DRAFT_NAME)?;
                if found != expected {
                    return Err(EngineError::precondition(format!(
                        "Expected '{}' as first draft item, got '{}'",
                        expected, found
                    )));
                }

                let edit_href = page
                    .doc
                    .query("draft-row:0:edit-link")
                    .and_then(|link| link.attr("href"))
                    .ok_or_else(|| {
                        EngineError::precondition(
                            "Could not find edit/submit link for first draft item",
                        )
                    })?;
                Ok(StepOutcome::Goto(resolve_href(page, &edit_href)?))
            }

            3 => self.edit_draft(page).await,

            // The submitted draft became a real release; capture its id and
            // head for the master release.
            4 => {
                page.ui.log("Determining new release ID");

                let new_id = release_id_from_url(page)?;
                state.set_str(NEW_ID, new_id);

                let target = match state.get(MASTER_ID).and_then(|v| v.as_str()) {
                    Some(master_id) => {
                        format!("https://www.discogs.com/master/edit/{}", master_id)
                    }
                    None => "https://www.discogs.com/master/create".to_string(),
                };
                Ok(StepOutcome::Goto(target))
            }

            // File the new release under the master, creating one if needed.
            5 => {
                // The master form populates asynchronously and exposes no
                // readiness signal; a fixed delay is the best available
                // heuristic.
                tokio::time::sleep(Duration::from_secs(1)).await;

                let new_id = state.require_str(NEW_ID)?.to_string();
                if state.get(MASTER_ID).and_then(|v| v.as_str()).is_some() {
                    add_release_to_master(page, &new_id)?;
                } else {
                    let original_id = state.require_str(ORIGINAL_ID)?.to_string();
                    set_releases_for_master(page, &[new_id.clone(), original_id], Some(&new_id))?;
                }
                let submit = write_master_release(page).await?;
                Ok(StepOutcome::Submit(submit))
            }

            6 => {
                page.ui.log("Completed duplicate as digital");
                Ok(StepOutcome::Finished { leave_log: true })
            }

            _ => Err(EngineError::UnsupportedStep {
                action: self.id().to_string(),
                step,
            }),
        }
    }
}
