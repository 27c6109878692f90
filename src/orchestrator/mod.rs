//! Application-level orchestration utilities.
//!
//! This module owns the submission lifecycle (submit, poll, supersede, dispose)
//! and post-run processing such as reports and exports. UI/CLI layers call into
//! this module to keep responsibilities separated.

mod controller;
mod post_process;
#[cfg(any(feature = "tui", test))]
mod session;

pub use controller::SubmissionController;
pub(crate) use post_process::{now_utc, process_run_completion};
#[cfg(feature = "tui")]
pub(crate) use post_process::build_report;
#[cfg(feature = "tui")]
pub(crate) use session::{run_controller, UiCommand};
