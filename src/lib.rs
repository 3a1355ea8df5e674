// SPDX-License-Identifier: MIT

//! pageflow: a resumable workflow engine for page-based web applications
//!
//! Drives multi-step, human-supervised automation tasks where each task
//! spans several full page navigations, i.e. full restarts of the running
//! context. Progress is persisted in a durable single-record store
//! ([`engine::StateStore`]); each page load re-enters through the
//! [`engine::Driver`], which resumes the [`engine::StepExecutor`] at the
//! persisted step. Asynchronous readiness conditions over the mutating
//! document tree live in [`wait`], mandatory human-approval checkpoints in
//! [`gate`]. The engine only ever touches the abstract page collaborators
//! in [`dom`]; the bundled [`flows`] and the in-memory simulation are the
//! page-specific side.

pub mod dom;
pub mod engine;
pub mod flows;
pub mod gate;
pub mod ui;
pub mod wait;

#[cfg(test)]
mod test_support;
