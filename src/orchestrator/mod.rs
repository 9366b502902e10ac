//! Application-level orchestration.
//!
//! This module owns the run lifecycle (start/cancel/pause, sequence replacement) and the
//! post-run summary. UI/CLI layers call into it and only ever see events.

mod controller;
mod post_process;


pub use controller::RunController;
pub(crate) use controller::{check_size, run_controller, UiCommand};
