//! Application-level orchestration.
//!
//! This module owns the session state and every operation that changes it: the read-side
//! refresh steps, the user actions built on them, and the command loop that serializes actions
//! coming from presentation layers. UI/CLI layers only send commands and render snapshots.

mod actions;
mod controller;
mod refresh;

pub(crate) use actions::{ActionOutcome, Controller};
pub(crate) use controller::{command_channel, dispatch, run_controller, ConsoleEvent, UiCommand};
