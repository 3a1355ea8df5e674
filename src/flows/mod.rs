// SPDX-License-Identifier: MIT

//! Bundled workflows
//!
//! The concrete automations shipped with the engine. Page coupling lives
//! here and nowhere else: the engine proper only ever sees the abstract
//! collaborator traits.

mod duplicate_release;
mod master;
mod master_release;

pub use duplicate_release::{DuplicateAsDigital, DUPLICATE_AS_FLAC, DUPLICATE_AS_WAV};
pub use master_release::{CreateMasterRelease, CREATE_MASTER_RELEASE};
