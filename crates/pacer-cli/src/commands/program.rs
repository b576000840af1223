use clap::Subcommand;
use pacer_core::program::format_clock;
use pacer_core::session::ProgressStore;
use pacer_core::Program;

use super::{open_progress, CmdResult};

#[derive(Subcommand)]
pub enum ProgramAction {
    /// List every workout with its completion status
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the intervals of one workout
    Show {
        /// Workout index (see `program list`)
        index: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ProgramAction) -> CmdResult {
    let program = Program::couch_to_5k();
    match action {
        ProgramAction::List { json } => {
            let record = open_progress()?.load();
            let next = record.next_incomplete_index(program.len());
            if json {
                let rows: Vec<_> = program
                    .iter()
                    .map(|w| {
                        serde_json::json!({
                            "index": w.ordinal,
                            "label": w.label,
                            "total_secs": w.total_duration_secs(),
                            "completed": record.is_completed(w.ordinal),
                            "next": w.ordinal == next,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            for w in program.iter() {
                let mark = if record.is_completed(w.ordinal) { "x" } else { " " };
                let pointer = if w.ordinal == next { "  <- next" } else { "" };
                println!(
                    "{:>3}  [{mark}]  {:<16} {:>6}{pointer}",
                    w.ordinal,
                    w.label,
                    format_clock(w.total_duration_secs())
                );
            }
        }
        ProgramAction::Show { index, json } => {
            let workout = program.get(index)?;
            if json {
                println!("{}", serde_json::to_string_pretty(workout)?);
                return Ok(());
            }
            println!(
                "{} ({} total)",
                workout.label,
                format_clock(workout.total_duration_secs())
            );
            for (i, interval) in workout.intervals.iter().enumerate() {
                println!(
                    "{:>3}. {:<8} {:>5}  {}",
                    i + 1,
                    interval.kind.as_str().to_uppercase(),
                    format_clock(interval.duration_secs),
                    interval.cue
                );
            }
        }
    }
    Ok(())
}
