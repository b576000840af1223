//! Elapsed-time clock, its background engine, and the interval math on top.

mod clock;
mod engine;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use clock::ElapsedClock;
pub use engine::{TimerEngine, TimerHandle, DEFAULT_CADENCE};
pub use resolver::Resolution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Stopped => "stopped",
            RunState::Running => "running",
            RunState::Paused => "paused",
        }
    }
}

/// Engine state at one instant. Each tick supersedes the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Milliseconds since start, excluding time spent paused.
    pub elapsed_ms: u64,
    pub state: RunState,
}

impl TimerSnapshot {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

/// Commands accepted by a running [`TimerEngine`], applied in send order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Reset,
}

/// Messages emitted by a [`TimerEngine`].
///
/// Every message carries the generation of the engine that produced it so a
/// consumer can drop anything left over from an engine it already tore down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerNotification {
    Tick {
        generation: u64,
        snapshot: TimerSnapshot,
    },
    StateChanged {
        generation: u64,
        state: RunState,
    },
}

impl TimerNotification {
    pub fn generation(&self) -> u64 {
        match self {
            TimerNotification::Tick { generation, .. }
            | TimerNotification::StateChanged { generation, .. } => *generation,
        }
    }
}
