// SPDX-License-Identifier: MIT

//! In-memory document simulation
//!
//! Backs the demo binary and the integration tests. Elements are flat,
//! addressed by selector strings; clicks carry declarative effects so a
//! simulated page can insert nodes, remove nodes, or navigate, emitting the
//! same mutation batches a live page would.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::broadcast;

use super::{DocumentTree, Element, Mutation, MutationBatch, MutationKind, Navigator, NodeSpec};

const FEED_CAPACITY: usize = 64;

/// What happens when a simulated element is clicked.
#[derive(Clone, Default, Debug)]
pub enum ClickEffect {
    #[default]
    None,
    /// Request navigation to the URL.
    Navigate(String),
    /// Insert the nodes into the document (one mutation batch).
    Insert(Vec<SimNode>),
    /// Remove the selectors from the document (one mutation batch).
    Remove(Vec<String>),
}

/// Declarative description of a node, used to build documents and to specify
/// `ClickEffect::Insert` payloads.
#[derive(Clone, Default, Debug)]
pub struct SimNode {
    pub selector: String,
    pub text: String,
    pub value: String,
    pub attrs: Vec<(String, String)>,
    pub hidden: bool,
    pub on_click: ClickEffect,
}

impl SimNode {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = effect;
        self
    }
}

#[derive(Debug)]
struct ElementState {
    text: String,
    value: String,
    attrs: BTreeMap<String, String>,
    hidden: bool,
    on_click: ClickEffect,
}

#[derive(Debug)]
pub struct SimElement {
    selector: String,
    state: Mutex<ElementState>,
    doc: Weak<DocInner>,
}

impl Element for SimElement {
    fn selector(&self) -> &str {
        &self.selector
    }

    fn text(&self) -> String {
        self.state.lock().unwrap().text.clone()
    }

    fn set_text(&self, text: &str) {
        self.state.lock().unwrap().text = text.to_string();
    }

    fn value(&self) -> String {
        self.state.lock().unwrap().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.state.lock().unwrap().value = value.to_string();
    }

    fn attr(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().attrs.get(name).cloned()
    }

    fn hidden(&self) -> bool {
        self.state.lock().unwrap().hidden
    }

    fn set_hidden(&self, hidden: bool) {
        self.state.lock().unwrap().hidden = hidden;
    }

    fn click(&self) {
        let effect = self.state.lock().unwrap().on_click.clone();
        let Some(doc) = self.doc.upgrade() else {
            return;
        };
        match effect {
            ClickEffect::None => {}
            ClickEffect::Navigate(url) => {
                let nav = doc.navigator.lock().unwrap().clone();
                match nav {
                    Some(nav) => nav.goto(&url),
                    None => log::warn!("click on '{}' wants navigation but no navigator is attached", self.selector),
                }
            }
            ClickEffect::Insert(nodes) => DocInner::insert_all(&doc, nodes),
            ClickEffect::Remove(selectors) => doc.remove_all(&selectors),
        }
    }

    fn remove(&self) {
        if let Some(doc) = self.doc.upgrade() {
            doc.remove_all(std::slice::from_ref(&self.selector));
        }
    }
}

struct DocInner {
    elements: Mutex<BTreeMap<String, Arc<SimElement>>>,
    feed: broadcast::Sender<MutationBatch>,
    navigator: Mutex<Option<Arc<dyn Navigator>>>,
}

impl DocInner {
    fn insert_all(self: &Arc<Self>, nodes: Vec<SimNode>) {
        let mut batch = MutationBatch::default();
        {
            let mut elements = self.elements.lock().unwrap();
            for node in nodes {
                let element = Arc::new(SimElement {
                    selector: node.selector.clone(),
                    state: Mutex::new(ElementState {
                        text: node.text,
                        value: node.value,
                        attrs: node.attrs.into_iter().collect(),
                        hidden: node.hidden,
                        on_click: node.on_click,
                    }),
                    doc: Arc::downgrade(self),
                });
                elements.insert(node.selector.clone(), element);
                batch.mutations.push(Mutation {
                    kind: MutationKind::Added,
                    selector: node.selector,
                });
            }
        }
        let _ = self.feed.send(batch);
    }

    fn remove_all(&self, selectors: &[String]) {
        let mut batch = MutationBatch::default();
        {
            let mut elements = self.elements.lock().unwrap();
            for selector in selectors {
                if elements.remove(selector).is_some() {
                    batch.mutations.push(Mutation {
                        kind: MutationKind::Removed,
                        selector: selector.clone(),
                    });
                }
            }
        }
        if !batch.mutations.is_empty() {
            let _ = self.feed.send(batch);
        }
    }
}

/// Simulated document tree.
#[derive(Clone)]
pub struct SimDocument {
    inner: Arc<DocInner>,
}

impl SimDocument {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            inner: Arc::new(DocInner {
                elements: Mutex::new(BTreeMap::new()),
                feed,
                navigator: Mutex::new(None),
            }),
        }
    }

    /// Build a document from a list of nodes without emitting mutations.
    pub fn with_nodes(nodes: Vec<SimNode>) -> Self {
        let doc = Self::new();
        {
            let mut elements = doc.inner.elements.lock().unwrap();
            for node in nodes {
                let element = Arc::new(SimElement {
                    selector: node.selector.clone(),
                    state: Mutex::new(ElementState {
                        text: node.text,
                        value: node.value,
                        attrs: node.attrs.into_iter().collect(),
                        hidden: node.hidden,
                        on_click: node.on_click,
                    }),
                    doc: Arc::downgrade(&doc.inner),
                });
                elements.insert(node.selector.clone(), element);
            }
        }
        doc
    }

    /// Attach the navigator used by `ClickEffect::Navigate`.
    pub fn set_navigator(&self, navigator: Arc<dyn Navigator>) {
        *self.inner.navigator.lock().unwrap() = Some(navigator);
    }

    /// Insert nodes, emitting one mutation batch.
    pub fn insert_nodes(&self, nodes: Vec<SimNode>) {
        DocInner::insert_all(&self.inner, nodes);
    }

    /// Remove selectors, emitting one mutation batch.
    pub fn remove(&self, selectors: &[String]) {
        self.inner.remove_all(selectors);
    }

    /// Number of live mutation-feed subscribers. Used by tests to verify
    /// waiters release their subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.feed.receiver_count()
    }
}

impl Default for SimDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree for SimDocument {
    fn query(&self, selector: &str) -> Option<Arc<dyn Element>> {
        let elements = self.inner.elements.lock().unwrap();
        elements
            .get(selector)
            .map(|e| Arc::clone(e) as Arc<dyn Element>)
    }

    fn query_all(&self, prefix: &str) -> Vec<Arc<dyn Element>> {
        let elements = self.inner.elements.lock().unwrap();
        elements
            .range(prefix.to_string()..)
            .take_while(|(selector, _)| selector.starts_with(prefix))
            .map(|(_, e)| Arc::clone(e) as Arc<dyn Element>)
            .collect()
    }

    fn insert(&self, node: NodeSpec) {
        let mut sim = SimNode::new(node.selector).text(node.text).value(node.value);
        sim.attrs = node.attrs;
        self.insert_nodes(vec![sim]);
    }

    fn subscribe(&self) -> broadcast::Receiver<MutationBatch> {
        self.inner.feed.subscribe()
    }
}

/// Records the navigation target so a harness can load the next page.
#[derive(Default)]
pub struct SimNavigator {
    pending: Mutex<Option<String>>,
}

impl SimNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the requested navigation target, if any.
    pub fn take(&self) -> Option<String> {
        self.pending.lock().unwrap().take()
    }

    pub fn pending(&self) -> Option<String> {
        self.pending.lock().unwrap().clone()
    }
}

impl Navigator for SimNavigator {
    fn goto(&self, url: &str) {
        log::info!("navigating to {}", url);
        *self.pending.lock().unwrap() = Some(url.to_string());
    }
}
