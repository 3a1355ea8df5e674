// SPDX-License-Identifier: MIT

//! End-to-end scenarios across simulated page loads.
//!
//! Each "load" builds a fresh document, console, and driver around a shared
//! store, the way a real navigation restarts the whole script.

use std::sync::Arc;

use url::Url;

use pageflow::dom::sim::{ClickEffect, SimDocument, SimNavigator, SimNode};
use pageflow::dom::DocumentTree;
use pageflow::engine::{
    Driver, ExecutionEnd, LoadOutcome, MemoryStore, PageContext, StateStore, WorkflowRegistry,
    WorkflowState,
};
use pageflow::flows::{CreateMasterRelease, DuplicateAsDigital, CREATE_MASTER_RELEASE};
use pageflow::ui::{Choice, Console, Responder, UserInterface};

struct Load {
    page: PageContext,
    doc: SimDocument,
    console: Console,
    nav: Arc<SimNavigator>,
    driver: Driver,
}

async fn registry() -> WorkflowRegistry {
    let registry = WorkflowRegistry::new();
    registry.register(Arc::new(CreateMasterRelease)).await;
    registry.register(Arc::new(DuplicateAsDigital::flac())).await;
    registry.register(Arc::new(DuplicateAsDigital::wav())).await;
    registry
}

async fn load(store: Arc<MemoryStore>, url: &str, doc: SimDocument, console: Console) -> Load {
    let nav = Arc::new(SimNavigator::new());
    doc.set_navigator(nav.clone());
    let page = PageContext {
        url: Url::parse(url).unwrap(),
        doc: Arc::new(doc.clone()),
        ui: Arc::new(console.clone()),
        nav: nav.clone(),
    };
    let driver = Driver::new(registry().await, store, Arc::new(console.clone()));
    Load {
        page,
        doc,
        console,
        nav,
        driver,
    }
}

fn artist_page() -> SimDocument {
    SimDocument::with_nodes(vec![
        SimNode::new("discography-grid"),
        SimNode::new("releases-table"),
        SimNode::new("release-link:0").attr("href", "/release/7001-artist-first"),
        SimNode::new("release-link:1").attr("href", "/release/7010-artist-second"),
        SimNode::new("release-link:2").attr("href", "/master/500-artist-best-of"),
    ])
}

fn master_create_page() -> SimDocument {
    SimDocument::with_nodes(vec![
        SimNode::new("master-releases"),
        SimNode::new("master-main"),
        SimNode::new("preview-button")
            .on_click(ClickEffect::Insert(vec![SimNode::new("object-preview")])),
        SimNode::new("save-master-button").on_click(ClickEffect::Navigate(
            "https://www.discogs.com/master/600-artist-first".to_string(),
        )),
    ])
}

/// Ticks two releases when the selection gate opens, then answers every gate
/// with its first choice.
struct SelectAndApprove {
    doc: SimDocument,
}

impl Responder for SelectAndApprove {
    fn choose(&self, message: &str, choices: &[Choice]) -> Option<String> {
        if message.contains("Select releases") {
            for id in ["7001", "7010"] {
                self.doc
                    .query(&format!("automator-checkbox:{}", id))
                    .unwrap()
                    .set_value("on");
            }
        }
        choices.first().map(|c| c.value.clone())
    }

    fn input(&self, _message: &str) -> Option<Option<String>> {
        None
    }
}

/// Answers every choice gate with its last choice (Cancel on the selection
/// overlay, the acknowledgment on failure gates) and declines inputs.
struct CancelEverything;

impl Responder for CancelEverything {
    fn choose(&self, _message: &str, choices: &[Choice]) -> Option<String> {
        choices.last().map(|c| c.value.clone())
    }

    fn input(&self, _message: &str) -> Option<Option<String>> {
        Some(None)
    }
}

#[tokio::test(start_paused = true)]
async fn create_master_release_across_three_loads() {
    let store = Arc::new(MemoryStore::new());

    // Load 1: artist page. Invoke from the idle menu, select two releases,
    // approve. State is persisted before the navigation request goes out.
    let doc = artist_page();
    let console = Console::with_responder(Arc::new(SelectAndApprove { doc: doc.clone() }));
    let first = load(
        store.clone(),
        "https://www.discogs.com/artist/123-artist",
        doc,
        console,
    )
    .await;

    assert_eq!(first.driver.on_load(&first.page).await, LoadOutcome::Idle);
    let menu = first.console.menu();
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0].id, CREATE_MASTER_RELEASE);

    let end = first.driver.invoke(CREATE_MASTER_RELEASE, &first.page).await;
    assert_eq!(end, Some(ExecutionEnd::Suspended));

    let persisted = store.read().unwrap().unwrap();
    assert_eq!(persisted.action_id, CREATE_MASTER_RELEASE);
    assert_eq!(persisted.action_state.step_id, Some(1));
    assert_eq!(
        persisted.action_state.get("selectedReleaseIds"),
        Some(&serde_json::json!(["7001", "7010"]))
    );
    assert_eq!(
        first.nav.take().as_deref(),
        Some("https://www.discogs.com/master/create")
    );

    // Load 2: the master create form. Resumes at step 1, fills the id list
    // sorted ascending with the first id as key release, submits after
    // approval.
    let doc = master_create_page();
    let console = Console::with_responder(Arc::new(SelectAndApprove { doc: doc.clone() }));
    let second = load(
        store.clone(),
        "https://www.discogs.com/master/create",
        doc,
        console,
    )
    .await;

    let outcome = second.driver.on_load(&second.page).await;
    assert_eq!(outcome, LoadOutcome::Ran(ExecutionEnd::Suspended));
    assert_eq!(
        second.doc.query("master-releases").unwrap().value(),
        "7001\n7010"
    );
    assert_eq!(second.doc.query("master-main").unwrap().value(), "7001");
    assert_eq!(store.read().unwrap().unwrap().action_state.step_id, Some(2));
    assert_eq!(
        second.nav.take().as_deref(),
        Some("https://www.discogs.com/master/600-artist-first")
    );

    // Load 3: the new master page. The terminal step clears the store and
    // returns to the idle menu with the log preserved.
    let third = load(
        store.clone(),
        "https://www.discogs.com/master/600-artist-first",
        SimDocument::new(),
        Console::new(),
    )
    .await;

    let outcome = third.driver.on_load(&third.page).await;
    assert_eq!(outcome, LoadOutcome::Ran(ExecutionEnd::Finished));
    assert!(store.read().unwrap().is_none());
    assert!(third
        .console
        .entries()
        .iter()
        .any(|e| e.contains("Completed creation of master release")));
    assert!(third.nav.take().is_none());
}

#[tokio::test]
async fn malformed_persisted_state_recovers_to_the_idle_menu() {
    let store = Arc::new(MemoryStore::new());
    store.set_raw("{not json");

    let run = load(
        store.clone(),
        "https://www.discogs.com/artist/123-artist",
        artist_page(),
        Console::new(),
    )
    .await;

    assert_eq!(run.driver.on_load(&run.page).await, LoadOutcome::Idle);
    assert!(store.read().unwrap().is_none());
    assert!(!run.console.menu().is_empty());
}

#[tokio::test]
async fn cancellation_empties_the_store_and_cleans_the_page() {
    let store = Arc::new(MemoryStore::new());
    let doc = artist_page();
    let console = Console::with_responder(Arc::new(CancelEverything));
    let run = load(
        store.clone(),
        "https://www.discogs.com/artist/123-artist",
        doc,
        console,
    )
    .await;

    let end = run.driver.invoke(CREATE_MASTER_RELEASE, &run.page).await;
    assert_eq!(end, Some(ExecutionEnd::Failed));

    assert!(store.read().unwrap().is_none());
    assert!(run.doc.query_all("automator-checkbox:").is_empty());
    assert!(run.nav.take().is_none());
    assert!(!run.console.menu().is_empty());

    // The redraw watcher was stopped; no subscription lingers once its
    // task is reaped.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(run.doc.subscriber_count(), 0);
}

#[tokio::test]
async fn unknown_persisted_step_is_fatal_after_acknowledgment() {
    let store = Arc::new(MemoryStore::new());
    let mut state = WorkflowState::new(CREATE_MASTER_RELEASE);
    state.action_state.step_id = Some(9);
    store.write(&state).unwrap();

    let run = load(
        store.clone(),
        "https://www.discogs.com/artist/123-artist",
        artist_page(),
        Console::new(),
    )
    .await;

    let driver = run.driver;
    let page = run.page.clone();
    let task = tokio::spawn(async move { driver.on_load(&page).await });

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let open = run.console.open_choices();
    assert_eq!(open.len(), 1);
    assert_eq!(
        open[0].message,
        "State 9 is not supported for 'create-master-release'"
    );
    // Until the user acknowledges, the stale record stays put.
    assert_eq!(store.read().unwrap().unwrap().action_state.step_id, Some(9));

    open[0].gate.resolve(&open[0].choices[0].value);
    assert_eq!(task.await.unwrap(), LoadOutcome::Ran(ExecutionEnd::Failed));
    assert!(store.read().unwrap().is_none());
    assert!(!run.console.menu().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reloading_at_the_same_step_reruns_only_that_step() {
    let store = Arc::new(MemoryStore::new());

    // A crash after the persist but before the navigation means the same
    // load can repeat. Each load runs step 1 exactly once, never step 0.
    let mut state = WorkflowState::new(CREATE_MASTER_RELEASE);
    state.action_state.step_id = Some(1);
    state
        .action_state
        .set("selectedReleaseIds", serde_json::json!(["7001", "7010"]));

    for _ in 0..2 {
        store.write(&state).unwrap();
        let doc = master_create_page();
        let console = Console::with_responder(Arc::new(SelectAndApprove { doc: doc.clone() }));
        let run = load(
            store.clone(),
            "https://www.discogs.com/master/create",
            doc,
            console,
        )
        .await;

        let outcome = run.driver.on_load(&run.page).await;
        assert_eq!(outcome, LoadOutcome::Ran(ExecutionEnd::Suspended));
        // Step 1 filled the form; step 0's selection overlay never appeared.
        assert_eq!(
            run.doc.query("master-releases").unwrap().value(),
            "7001\n7010"
        );
        assert!(run.doc.query_all("automator-checkbox:").is_empty());
        assert_eq!(store.read().unwrap().unwrap().action_state.step_id, Some(2));
    }
}
