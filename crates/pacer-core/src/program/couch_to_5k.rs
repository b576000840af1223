//! Nine weeks, three days a week, plus a short workout for checking cues.

use super::{IntervalDefinition, IntervalKind, Program, WorkoutDefinition};

const WARMUP_SECS: u64 = 300;
const COOLDOWN_SECS: u64 = 300;

fn run(secs: u64) -> IntervalDefinition {
    IntervalDefinition::new(IntervalKind::Run, secs, "Start running.")
}

fn walk(secs: u64) -> IntervalDefinition {
    IntervalDefinition::new(IntervalKind::Walk, secs, "Walk.")
}

fn repeat(pattern: &[IntervalDefinition], times: usize) -> Vec<IntervalDefinition> {
    let mut out = Vec::with_capacity(pattern.len() * times);
    for _ in 0..times {
        out.extend_from_slice(pattern);
    }
    out
}

/// Wrap the main set in the standard warm-up and cool-down walks.
fn workout(week: u8, day: u8, main_set: Vec<IntervalDefinition>) -> WorkoutDefinition {
    let mut intervals = Vec::with_capacity(main_set.len() + 2);
    intervals.push(IntervalDefinition::new(
        IntervalKind::Warmup,
        WARMUP_SECS,
        "Begin your warm-up walk.",
    ));
    intervals.extend(main_set);
    intervals.push(IntervalDefinition::new(
        IntervalKind::Cooldown,
        COOLDOWN_SECS,
        "Cool down. Walk it out.",
    ));
    WorkoutDefinition {
        ordinal: 0,
        week,
        day,
        label: format!("Week {week} \u{2022} Day {day}"),
        intervals,
    }
}

fn week_days(week: u8, main_set: impl Fn() -> Vec<IntervalDefinition>) -> Vec<WorkoutDefinition> {
    (1..=3).map(|day| workout(week, day, main_set())).collect()
}

impl Program {
    /// The standard Couch to 5K progression.
    pub fn couch_to_5k() -> Self {
        let mut workouts = Vec::new();

        workouts.extend(week_days(1, || repeat(&[run(60), walk(90)], 8)));
        workouts.extend(week_days(2, || repeat(&[run(90), walk(120)], 6)));
        workouts.extend(week_days(3, || {
            repeat(&[run(90), walk(90), run(180), walk(180)], 2)
        }));
        workouts.extend(week_days(4, || {
            vec![
                run(180),
                walk(90),
                run(300),
                walk(150),
                run(180),
                walk(90),
                run(300),
            ]
        }));

        workouts.push(workout(5, 1, vec![run(300), walk(180), run(300), walk(180), run(300)]));
        workouts.push(workout(5, 2, vec![run(480), walk(300), run(480)]));
        workouts.push(workout(5, 3, vec![run(1200)]));

        workouts.push(workout(6, 1, vec![run(300), walk(180), run(480), walk(180), run(300)]));
        workouts.push(workout(6, 2, vec![run(600), walk(180), run(600)]));
        workouts.push(workout(6, 3, vec![run(1500)]));

        workouts.extend(week_days(7, || vec![run(1500)]));
        workouts.extend(week_days(8, || vec![run(1680)]));
        workouts.extend(week_days(9, || vec![run(1800)]));

        workouts.push(WorkoutDefinition {
            ordinal: 0,
            week: 0,
            day: 0,
            label: "Testing".into(),
            intervals: repeat(
                &[
                    IntervalDefinition::new(IntervalKind::Run, 10, "Test."),
                    IntervalDefinition::new(IntervalKind::Walk, 10, "Test."),
                ],
                6,
            ),
        });

        for (i, w) in workouts.iter_mut().enumerate() {
            w.ordinal = i;
        }
        Self { workouts }
    }
}
