//! Workout session orchestration.

mod controller;
mod display;
mod ports;
mod runner;

pub use controller::{announcement, Collaborators, SessionController, SessionPhase};
pub use display::{CompletionSummary, DisplayPayload};
pub use ports::{CueSink, DisplaySink, KeepAlive, NoKeepAlive, ProgressStore};
pub use runner::{run_session, SessionCommand};
