//! The preloaded training program.
//!
//! A [`Program`] is an ordered list of [`WorkoutDefinition`]s, each an ordered
//! list of [`IntervalDefinition`]s. Everything here is built once at startup
//! and never mutated afterwards.

mod couch_to_5k;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    Warmup,
    Run,
    Walk,
    Cooldown,
}

impl IntervalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Warmup => "warmup",
            IntervalKind::Run => "run",
            IntervalKind::Walk => "walk",
            IntervalKind::Cooldown => "cooldown",
        }
    }
}

impl std::fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalDefinition {
    pub kind: IntervalKind,
    /// Duration in whole seconds.
    pub duration_secs: u64,
    /// Text announced when the interval begins.
    pub cue: String,
}

impl IntervalDefinition {
    pub fn new(kind: IntervalKind, duration_secs: u64, cue: impl Into<String>) -> Self {
        Self {
            kind,
            duration_secs,
            cue: cue.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutDefinition {
    /// Position within the program.
    pub ordinal: usize,
    pub week: u8,
    pub day: u8,
    pub label: String,
    pub intervals: Vec<IntervalDefinition>,
}

impl WorkoutDefinition {
    pub fn total_duration_secs(&self) -> u64 {
        self.intervals.iter().map(|iv| iv.duration_secs).sum()
    }

    /// Counter label shown under the timer.
    ///
    /// Run and walk intervals are numbered among themselves; warm-up and
    /// cool-down get a fixed label.
    pub fn interval_counter(&self, index: usize) -> String {
        let Some(interval) = self.intervals.get(index) else {
            return String::new();
        };
        match interval.kind {
            IntervalKind::Warmup => "Warm-up".to_string(),
            IntervalKind::Cooldown => "Cool-down".to_string(),
            IntervalKind::Run | IntervalKind::Walk => {
                let is_active = |iv: &IntervalDefinition| {
                    matches!(iv.kind, IntervalKind::Run | IntervalKind::Walk)
                };
                let position = self.intervals[..index].iter().filter(|iv| is_active(iv)).count();
                let total = self.intervals.iter().filter(|iv| is_active(iv)).count();
                format!("Interval {} of {}", position + 1, total)
            }
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.intervals.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "intervals of '{}'",
                self.label
            )));
        }
        for (i, iv) in self.intervals.iter().enumerate() {
            if iv.duration_secs == 0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}[{i}].duration_secs", self.label),
                    message: "must be greater than zero".into(),
                });
            }
            if iv.cue.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}[{i}].cue", self.label),
                    message: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub workouts: Vec<WorkoutDefinition>,
}

impl Program {
    /// Build a program from workouts, checking every catalog invariant.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if the list is empty, a workout has no
    /// intervals, an interval has a zero duration or blank cue, or an ordinal
    /// does not match its position.
    pub fn new(workouts: Vec<WorkoutDefinition>) -> Result<Self, ValidationError> {
        let program = Self { workouts };
        program.validate()?;
        Ok(program)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workouts.is_empty() {
            return Err(ValidationError::EmptyCollection("program".into()));
        }
        for (i, w) in self.workouts.iter().enumerate() {
            if w.ordinal != i {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}.ordinal", w.label),
                    message: format!("expected {i}, found {}", w.ordinal),
                });
            }
            w.validate()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&WorkoutDefinition, ValidationError> {
        self.workouts
            .get(index)
            .ok_or_else(|| ValidationError::OutOfBounds {
                collection: "program".into(),
                index,
                len: self.workouts.len(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkoutDefinition> {
        self.workouts.iter()
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::couch_to_5k()
    }
}

/// Render whole seconds as `m:ss`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_counter_skips_warmup_and_cooldown() {
        let program = Program::couch_to_5k();
        let w = program.get(0).unwrap();
        assert_eq!(w.interval_counter(0), "Warm-up");
        assert_eq!(w.interval_counter(1), "Interval 1 of 16");
        assert_eq!(w.interval_counter(2), "Interval 2 of 16");
        assert_eq!(w.interval_counter(w.intervals.len() - 1), "Cool-down");
        assert_eq!(w.interval_counter(99), "");
    }

    #[test]
    fn get_out_of_range_is_rejected() {
        let program = Program::couch_to_5k();
        let err = program.get(program.len()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfBounds { len: 28, .. }));
    }

    #[test]
    fn new_rejects_zero_duration() {
        let bad = WorkoutDefinition {
            ordinal: 0,
            week: 1,
            day: 1,
            label: "bad".into(),
            intervals: vec![IntervalDefinition::new(IntervalKind::Run, 0, "Go.")],
        };
        assert!(Program::new(vec![bad]).is_err());
    }

    #[test]
    fn new_rejects_empty_intervals_and_blank_cue() {
        let empty = WorkoutDefinition {
            ordinal: 0,
            week: 1,
            day: 1,
            label: "empty".into(),
            intervals: vec![],
        };
        assert!(matches!(
            Program::new(vec![empty]),
            Err(ValidationError::EmptyCollection(_))
        ));

        let blank = WorkoutDefinition {
            ordinal: 0,
            week: 1,
            day: 1,
            label: "blank".into(),
            intervals: vec![IntervalDefinition::new(IntervalKind::Walk, 30, "  ")],
        };
        assert!(Program::new(vec![blank]).is_err());
    }

    #[test]
    fn new_rejects_misplaced_ordinal() {
        let mut w = Program::couch_to_5k().workouts.remove(3);
        w.ordinal = 3;
        assert!(Program::new(vec![w]).is_err());
    }

    #[test]
    fn format_clock_pads_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(1800), "30:00");
    }
}
