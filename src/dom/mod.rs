// SPDX-License-Identifier: MIT

//! Document tree abstractions
//!
//! The engine never touches a concrete page model. Everything it needs from
//! the host application is expressed through these traits: querying elements
//! by selector, observing structural mutations, and triggering navigation
//! (which ends the current execution context).

pub mod sim;

use std::sync::Arc;
use tokio::sync::broadcast;

/// Structural change to the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Added,
    Removed,
}

/// One node-level mutation.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub kind: MutationKind,
    pub selector: String,
}

/// A batch of mutations delivered together, mirroring how mutation observers
/// report grouped changes.
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    pub mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn added(&self, selector: &str) -> bool {
        self.mutations
            .iter()
            .any(|m| m.kind == MutationKind::Added && m.selector == selector)
    }

    pub fn removed(&self, selector: &str) -> bool {
        self.mutations
            .iter()
            .any(|m| m.kind == MutationKind::Removed && m.selector == selector)
    }
}

/// A handle to a single document node.
pub trait Element: Send + Sync + std::fmt::Debug {
    /// Selector this element answers to.
    fn selector(&self) -> &str;

    fn text(&self) -> String;
    fn set_text(&self, text: &str);

    fn value(&self) -> String;
    fn set_value(&self, value: &str);

    fn attr(&self, name: &str) -> Option<String>;

    fn hidden(&self) -> bool;
    fn set_hidden(&self, hidden: bool);

    /// Activate the element. May mutate the document or trigger navigation.
    fn click(&self);

    /// Detach the element from the document.
    fn remove(&self);
}

/// Description of a node the engine wants to add to the page, e.g. a
/// selection checkbox or an instructions span overlaid on the host UI.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub selector: String,
    pub text: String,
    pub value: String,
    pub attrs: Vec<(String, String)>,
}

impl NodeSpec {
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
}

/// The continuously mutating document tree of the current page.
pub trait DocumentTree: Send + Sync {
    /// Find the element matching `selector` exactly.
    fn query(&self, selector: &str) -> Option<Arc<dyn Element>>;

    /// Find all elements whose selector starts with `prefix`, in document
    /// order.
    fn query_all(&self, prefix: &str) -> Vec<Arc<dyn Element>>;

    /// Add an overlay node to the document.
    fn insert(&self, node: NodeSpec);

    /// Subscribe to the structural-mutation feed. Dropping the receiver
    /// unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<MutationBatch>;
}

/// Navigation primitive. `goto` ends the current execution context; the next
/// page load re-enters through the driver.
pub trait Navigator: Send + Sync {
    fn goto(&self, url: &str);
}
