use serde::{Deserialize, Serialize};

use crate::program::{IntervalKind, WorkoutDefinition};
use crate::timer::{resolver, RunState};

/// Everything a front end needs to draw one frame of the workout screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPayload {
    pub workout_index: usize,
    pub interval_index: usize,
    pub interval_kind: IntervalKind,
    /// "Interval 3 of 16", "Warm-up", ...
    pub interval_counter: String,
    /// Rounded up, so a fresh interval shows its full length.
    pub remaining_secs: u64,
    /// Rounded down.
    pub total_elapsed_secs: u64,
    /// 0.0 ..= 1.0 across the whole workout.
    pub progress_fraction: f64,
    pub run_state: RunState,
}

impl DisplayPayload {
    pub fn new(
        workout: &WorkoutDefinition,
        interval_index: usize,
        elapsed_secs: f64,
        run_state: RunState,
    ) -> Self {
        let total = resolver::total_duration(workout) as f64;
        let elapsed = elapsed_secs.max(0.0);
        let progress_fraction = if total > 0.0 {
            (elapsed / total).min(1.0)
        } else {
            0.0
        };
        Self {
            workout_index: workout.ordinal,
            interval_index,
            interval_kind: workout.intervals[interval_index].kind,
            interval_counter: workout.interval_counter(interval_index),
            remaining_secs: resolver::remaining_in_interval(workout, interval_index, elapsed).ceil()
                as u64,
            total_elapsed_secs: elapsed.floor() as u64,
            progress_fraction,
            run_state,
        }
    }
}

/// Shown after a workout finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub workout_index: usize,
    pub label: String,
    pub total_secs: u64,
    /// Workout to suggest next.
    pub next_index: usize,
    /// Every workout in the program has been completed.
    pub program_finished: bool,
}
