// SPDX-License-Identifier: MIT

//! Create-master-release workflow
//!
//! Overlays selection checkboxes on an artist's discography listing, lets
//! the human pick the releases that belong together, then creates the master
//! release on the dedicated form. The listing is live (the host re-renders
//! it on filtering and paging), so the overlay is redrawn through the
//! debounced watcher.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::master::{set_releases_for_master, write_master_release};
use crate::dom::{DocumentTree, NodeSpec};
use crate::engine::error::EngineError;
use crate::engine::state::ActionState;
use crate::engine::workflow::{PageContext, StepOutcome, Workflow};
use crate::ui::Choice;
use crate::wait::{DebouncedWatcher, DEFAULT_QUIET};

pub const CREATE_MASTER_RELEASE: &str = "create-master-release";

const SELECTED_RELEASE_IDS: &str = "selectedReleaseIds";
const CHECKBOX_PREFIX: &str = "automator-checkbox:";

static ARTIST_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/artist/\d+(-[^/]+)+$").unwrap());
static CATALOG_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([a-z]+)/(\d+)(-[^/]+)+$").unwrap());

/// Extract `(kind, id)` from a catalog href like `/release/123-artist-title`.
fn parse_catalog_href(href: &str) -> Option<(String, String)> {
    let captures = CATALOG_HREF.captures(href)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Redraw the selection overlay: one checkbox per plain release row, keeping
/// the ticked state of boxes that already exist. Master rows are skipped.
fn draw_checkboxes(doc: &dyn DocumentTree) {
    let existing = doc.query_all(CHECKBOX_PREFIX);
    let checked: HashSet<String> = existing
        .iter()
        .filter(|cb| cb.value() == "on")
        .filter_map(|cb| {
            cb.selector()
                .strip_prefix(CHECKBOX_PREFIX)
                .map(str::to_string)
        })
        .collect();
    for checkbox in existing {
        checkbox.remove();
    }

    for link in doc.query_all("release-link:") {
        let Some(href) = link.attr("href") else {
            continue;
        };
        let Some((kind, id)) = parse_catalog_href(&href) else {
            continue;
        };
        if kind != "release" {
            continue;
        }

        let mut node = NodeSpec::new(format!("{}{}", CHECKBOX_PREFIX, id));
        if checked.contains(&id) {
            node = node.value("on");
        }
        doc.insert(node);
    }
}

fn remove_checkboxes(doc: &dyn DocumentTree) {
    for checkbox in doc.query_all(CHECKBOX_PREFIX) {
        checkbox.remove();
    }
}

fn ticked_ids(doc: &dyn DocumentTree) -> Vec<String> {
    doc.query_all(CHECKBOX_PREFIX)
        .iter()
        .filter(|cb| cb.value() == "on")
        .filter_map(|cb| {
            cb.selector()
                .strip_prefix(CHECKBOX_PREFIX)
                .map(str::to_string)
        })
        .collect()
}

pub struct CreateMasterRelease;

#[async_trait]
impl Workflow for CreateMasterRelease {
    fn id(&self) -> &str {
        CREATE_MASTER_RELEASE
    }

    fn title(&self) -> &str {
        "Create Master Release"
    }

    fn icon(&self) -> &str {
        "album"
    }

    fn is_enabled(&self, page: &PageContext) -> bool {
        ARTIST_PAGE.is_match(page.url.as_str())
    }

    async fn initialize(
        &self,
        page: &PageContext,
        state: &mut ActionState,
    ) -> Result<(), EngineError> {
        if !ARTIST_PAGE.is_match(page.url.as_str()) {
            return Err(EngineError::precondition(
                "Artist page URL does not match expected format, cannot continue.",
            ));
        }
        state.set(SELECTED_RELEASE_IDS, json!([]));
        Ok(())
    }

    async fn step(
        &self,
        step: u32,
        page: &PageContext,
        state: &mut ActionState,
    ) -> Result<StepOutcome, EngineError> {
        match step {
            // Selection: overlay checkboxes on the listing and wait for the
            // human to pick releases and confirm.
            0 => {
                if page.doc.query("discography-grid").is_none() {
                    return Err(EngineError::precondition(
                        "Could not find discography grid",
                    ));
                }

                draw_checkboxes(page.doc.as_ref());
                // Restore ticks from an earlier pass, if any.
                for id in state.require_str_list(SELECTED_RELEASE_IDS)? {
                    if let Some(checkbox) =
                        page.doc.query(&format!("{}{}", CHECKBOX_PREFIX, id))
                    {
                        checkbox.set_value("on");
                    }
                }

                // The host re-renders the listing on filtering/paging; keep
                // the overlay alive through those redraws. Removal of the
                // releases table only signals the loading placeholder.
                let watcher = {
                    let doc = page.doc.clone();
                    DebouncedWatcher::spawn(
                        page.doc.clone(),
                        DEFAULT_QUIET,
                        |batch| batch.removed("releases-table"),
                        move || draw_checkboxes(doc.as_ref()),
                    )
                };

                let gate = page.ui.present_choices(
                    "Select releases, when finished click Create Master Release:",
                    vec![
                        Choice::new("Create Master Release", "approve"),
                        Choice::new("Cancel", "cancel"),
                    ],
                );
                let choice = gate.wait().await;
                watcher.stop();

                if choice.as_deref() != Some("approve") {
                    remove_checkboxes(page.doc.as_ref());
                    return Err(EngineError::cancelled("Cancelled by user."));
                }

                let selected = ticked_ids(page.doc.as_ref());
                state.set(
                    SELECTED_RELEASE_IDS,
                    Value::Array(selected.into_iter().map(Value::String).collect()),
                );
                Ok(StepOutcome::Goto(
                    "https://www.discogs.com/master/create".to_string(),
                ))
            }

            // Creation: fill the master form and commit through the
            // approval gate.
            1 => {
                // The create form populates asynchronously and exposes no
                // readiness signal; a fixed delay is the best available
                // heuristic.
                tokio::time::sleep(Duration::from_secs(1)).await;

                let ids = state.require_str_list(SELECTED_RELEASE_IDS)?;
                set_releases_for_master(page, &ids, None)?;
                let submit = write_master_release(page).await?;
                Ok(StepOutcome::Submit(submit))
            }

            2 => {
                page.ui.log("Completed creation of master release");
                Ok(StepOutcome::Finished { leave_log: true })
            }

            _ => Err(EngineError::UnsupportedStep {
                action: self.id().to_string(),
                step,
            }),
        }
    }
}
