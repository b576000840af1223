use clap::Subcommand;
use pacer_core::session::{NoKeepAlive, ProgressStore};
use pacer_core::{Collaborators, Config, CueOutput, Program, SessionController};

use super::{open_progress, CmdResult};
use crate::terminal::{self, TerminalDisplay};

const RESET_PROMPT: &str = "Reset all progress? This cannot be undone.";

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Show completed workouts and the next one to run
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget all completed workouts
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub fn run(action: ProgressAction) -> CmdResult {
    let program = Program::couch_to_5k();
    match action {
        ProgressAction::Show { json } => {
            let record = open_progress()?.load();
            let next = record.next_incomplete_index(program.len());
            if json {
                let out = serde_json::json!({
                    "completed_workouts": record.completed_workouts,
                    "last_completed_index": record.last_completed_index,
                    "last_active_date": record.last_active_date,
                    "next_index": next,
                    "program_finished": record.all_complete(program.len()),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }
            println!(
                "Completed: {} of {}",
                record.completed_workouts.len(),
                program.len()
            );
            if let Some(last) = record.last_completed_index.and_then(|i| program.get(i).ok()) {
                println!("Last completed: {}", last.label);
            }
            if let Some(date) = record.last_active_date {
                println!("Last active: {date}");
            }
            if record.all_complete(program.len()) {
                println!("You've completed the entire program!");
            } else if let Ok(w) = program.get(next) {
                println!("Next: {} ({})", w.label, next);
            }
        }
        ProgressAction::Reset { yes } => {
            let confirmed = yes || terminal::confirm(RESET_PROMPT)?;
            let collaborators = Collaborators {
                progress: Box::new(open_progress()?),
                cues: Box::new(CueOutput::new(None, false)),
                keep_alive: Box::new(NoKeepAlive),
                display: Box::new(TerminalDisplay::new(program.clone(), false)),
            };
            let cadence = Config::load_or_default().timer.cadence();
            let (mut controller, _notifications) =
                SessionController::new(program, collaborators, cadence);
            match controller.reset_progress(confirmed) {
                Some(_) => println!("progress reset"),
                None => println!("progress kept"),
            }
        }
    }
    Ok(())
}
