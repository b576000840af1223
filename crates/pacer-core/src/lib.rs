//! # Pacer Core Library
//!
//! This library provides the core logic for Pacer, a guided interval-training
//! companion that walks a runner through a fixed multi-week program. All
//! operations are available to the standalone CLI; any other front end is a
//! thin presentation layer over the same core.
//!
//! ## Architecture
//!
//! - **Program**: the immutable, preloaded catalog of workouts
//! - **Timer Engine**: a drift-corrected clock running on its own tokio task,
//!   talking to the rest of the system only through channels
//! - **Resolver**: pure functions mapping elapsed time to the active interval
//! - **Session**: the state machine that turns ticks into cues, display
//!   payloads and completion records
//! - **Cue / Storage**: the speech, keep-alive and persistence collaborators
//!
//! ## Key Components
//!
//! - [`Program`]: the workout catalog
//! - [`TimerEngine`]: background elapsed-time clock
//! - [`SessionController`]: session state machine
//! - [`SqliteProgressStore`]: completion history persistence
//! - [`Config`]: application configuration management

pub mod cue;
pub mod error;
pub mod events;
pub mod program;
pub mod session;
pub mod storage;
pub mod timer;

pub use cue::{CueOutput, KeepAwake};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::SessionEvent;
pub use program::{IntervalDefinition, IntervalKind, Program, WorkoutDefinition};
pub use session::{
    Collaborators, CompletionSummary, DisplayPayload, SessionCommand, SessionController,
    SessionPhase,
};
pub use storage::{Config, Database, ProgressRecord, SqliteProgressStore};
pub use timer::{RunState, TimerCommand, TimerEngine, TimerHandle, TimerNotification, TimerSnapshot};
