// SPDX-License-Identifier: MIT

//! Shared fixtures for unit tests.

use std::sync::Arc;

use url::Url;

use crate::dom::sim::{SimDocument, SimNavigator};
use crate::engine::workflow::PageContext;
use crate::ui::Console;

/// A simulated page plus handles to its collaborators.
pub struct TestPage {
    pub page: PageContext,
    pub doc: SimDocument,
    pub console: Console,
    pub nav: Arc<SimNavigator>,
}

pub fn page_parts(url: &str, doc: SimDocument, console: Console) -> TestPage {
    let nav = Arc::new(SimNavigator::new());
    doc.set_navigator(nav.clone());
    let page = PageContext {
        url: Url::parse(url).unwrap(),
        doc: Arc::new(doc.clone()),
        ui: Arc::new(console.clone()),
        nav: nav.clone(),
    };
    TestPage {
        page,
        doc,
        console,
        nav,
    }
}

/// A bare page context for tests that only look at the URL.
pub fn page_at(url: &str) -> PageContext {
    page_parts(url, SimDocument::new(), Console::new()).page
}
