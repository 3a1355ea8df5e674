// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use url::Url;

use pageflow::dom::sim::{ClickEffect, SimDocument, SimNavigator, SimNode};
use pageflow::dom::DocumentTree;
use pageflow::engine::{Driver, FileStore, LoadOutcome, PageContext, StateStore, WorkflowRegistry};
use pageflow::flows::{CreateMasterRelease, DuplicateAsDigital, CREATE_MASTER_RELEASE};
use pageflow::ui::{Choice, Console, Responder, UserInterface};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the persisted workflow state
    #[arg(long, default_value = ".pageflow-state.json")]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the create-master-release workflow against the built-in
    /// simulated site, reloading pages the way a browser would
    Demo,
    /// Inspect the persisted workflow state
    State {
        /// Clear the record instead of printing it
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let store = Arc::new(FileStore::new(&args.state_file));

    match args.command {
        Commands::Demo => run_demo(store).await?,
        Commands::State { clear } => {
            if clear {
                store.clear()?;
                println!("State cleared");
            } else {
                match store.read()? {
                    Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
                    None => println!("No active workflow"),
                }
            }
        }
    }

    Ok(())
}

/// Scripted human: ticks the demo releases when the selection gate opens and
/// approves everything else.
struct DemoUser {
    doc: SimDocument,
}

impl Responder for DemoUser {
    fn choose(&self, message: &str, choices: &[Choice]) -> Option<String> {
        if message.contains("Select releases") {
            for id in ["7001", "7010"] {
                if let Some(checkbox) = self.doc.query(&format!("automator-checkbox:{}", id)) {
                    checkbox.set_value("on");
                }
            }
        }
        println!("  [gate] {} -> {}", message, choices.first()?.label);
        choices.first().map(|c| c.value.clone())
    }

    fn input(&self, message: &str) -> Option<Option<String>> {
        println!("  [input] {}", message);
        Some(Some("https://example.test/reference".to_string()))
    }
}

fn demo_page(url: &Url) -> SimDocument {
    if url.path().starts_with("/artist/") {
        SimDocument::with_nodes(vec![
            SimNode::new("discography-grid"),
            SimNode::new("releases-table"),
            SimNode::new("release-link:0").attr("href", "/release/7001-the-simulants-first"),
            SimNode::new("release-link:1").attr("href", "/release/7010-the-simulants-second"),
            SimNode::new("release-link:2").attr("href", "/master/500-the-simulants-best-of"),
        ])
    } else if url.path().starts_with("/master/create") {
        SimDocument::with_nodes(vec![
            SimNode::new("master-releases"),
            SimNode::new("master-main"),
            SimNode::new("preview-button").on_click(ClickEffect::Insert(vec![SimNode::new(
                "object-preview",
            )])),
            SimNode::new("save-master-button").on_click(ClickEffect::Navigate(
                "https://www.discogs.com/master/600-the-simulants-first".to_string(),
            )),
        ])
    } else {
        SimDocument::new()
    }
}

async fn run_demo(store: Arc<FileStore>) -> anyhow::Result<()> {
    let registry = WorkflowRegistry::new();
    registry.register(Arc::new(CreateMasterRelease)).await;
    registry.register(Arc::new(DuplicateAsDigital::flac())).await;
    registry.register(Arc::new(DuplicateAsDigital::wav())).await;

    let mut url = Url::parse("https://www.discogs.com/artist/123-the-simulants")?;
    let mut first_load = true;

    loop {
        println!("== load: {}", url);
        let doc = demo_page(&url);
        let nav = Arc::new(SimNavigator::new());
        doc.set_navigator(nav.clone());
        let console = Console::with_responder(Arc::new(DemoUser { doc: doc.clone() }));
        let page = PageContext {
            url: url.clone(),
            doc: Arc::new(doc.clone()),
            ui: Arc::new(console.clone()),
            nav: nav.clone(),
        };

        let driver = Driver::new(registry.clone(), store.clone(), Arc::new(console.clone()));
        let outcome = driver.on_load(&page).await;
        if first_load && outcome == LoadOutcome::Idle {
            first_load = false;
            driver.invoke(CREATE_MASTER_RELEASE, &page).await;
        }

        for entry in console.entries() {
            println!("  [log] {}", entry);
        }

        match nav.take() {
            Some(next) => url = Url::parse(&next)?,
            None => break,
        }
    }

    println!("== done");
    Ok(())
}
