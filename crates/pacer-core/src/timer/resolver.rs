//! Pure interval math: which interval is active at a given elapsed time.
//!
//! Elapsed values are fractional seconds. A boundary instant belongs to the
//! interval that starts there, not the one that ends there.

use serde::{Deserialize, Serialize};

use crate::program::WorkoutDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Active interval. When `is_past_end` is set this is the last interval.
    pub index: usize,
    pub is_past_end: bool,
}

pub fn total_duration(workout: &WorkoutDefinition) -> u64 {
    workout.total_duration_secs()
}

/// Sum of the durations strictly before `index`.
pub fn elapsed_before_interval(workout: &WorkoutDefinition, index: usize) -> u64 {
    workout
        .intervals
        .iter()
        .take(index)
        .map(|iv| iv.duration_secs)
        .sum()
}

pub fn resolve_active_interval(workout: &WorkoutDefinition, elapsed_secs: f64) -> Resolution {
    let mut upper = 0u64;
    for (index, iv) in workout.intervals.iter().enumerate() {
        upper += iv.duration_secs;
        if elapsed_secs < upper as f64 {
            return Resolution {
                index,
                is_past_end: false,
            };
        }
    }
    Resolution {
        index: workout.intervals.len().saturating_sub(1),
        is_past_end: true,
    }
}

pub fn remaining_in_interval(workout: &WorkoutDefinition, index: usize, elapsed_secs: f64) -> f64 {
    let Some(interval) = workout.intervals.get(index) else {
        return 0.0;
    };
    let into = elapsed_secs - elapsed_before_interval(workout, index) as f64;
    (interval.duration_secs as f64 - into).max(0.0)
}
