use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::program::IntervalKind;

/// Every session state change produces an Event.
/// Front ends print or log them; nothing in the core reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    WorkoutStarted {
        workout_index: usize,
        label: String,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    IntervalChanged {
        workout_index: usize,
        interval_index: usize,
        kind: IntervalKind,
        /// Text actually announced, after the final-run override.
        announced: String,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        workout_index: usize,
        next_index: usize,
        program_finished: bool,
        at: DateTime<Utc>,
    },
    WorkoutStopped {
        workout_index: usize,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    ProgressReset {
        at: DateTime<Utc>,
    },
}
