// SPDX-License-Identifier: MIT

//! Asynchronous waits over the document tree
//!
//! `readiness` suspends until a predicate over the mutating document becomes
//! true; `debounce` coalesces mutation bursts for redraw-style consumers.
//! Neither carries a timeout: bounded waits are composed by racing a human
//! "skip" gate against the waiter.

mod debounce;
mod readiness;

pub use debounce::{DebouncedWatcher, DEFAULT_QUIET};
pub use readiness::{until_ready_or_skip, wait_for, wait_for_selector, SkipRace, WaitError};
