//! Terminal presentation and keyboard input for `pacer run`.

use std::io::{BufRead, Write};

use pacer_core::program::format_clock;
use pacer_core::session::DisplaySink;
use pacer_core::{
    CompletionSummary, DisplayPayload, Program, RunState, SessionCommand, WorkoutDefinition,
};
use tokio::sync::mpsc;

const BAR_WIDTH: usize = 20;
const STOP_PROMPT: &str = "Stop this workout? Progress won't be saved.";
const PROGRAM_FINISHED: &str = "You've completed the entire program!";

/// Draws the workout either as a single refreshing status line or as
/// newline-delimited JSON.
pub struct TerminalDisplay {
    program: Program,
    json: bool,
    line_open: bool,
}

impl TerminalDisplay {
    pub fn new(program: Program, json: bool) -> Self {
        Self {
            program,
            json,
            line_open: false,
        }
    }

    fn close_line(&mut self) {
        if self.line_open {
            println!();
            self.line_open = false;
        }
    }
}

impl DisplaySink for TerminalDisplay {
    fn render(&mut self, payload: &DisplayPayload) {
        if self.json {
            if let Ok(line) = serde_json::to_string(payload) {
                println!("{line}");
            }
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r\x1b[2K{}", status_line(payload));
        let _ = out.flush();
        self.line_open = true;
    }

    fn restyle(&mut self, workout: &WorkoutDefinition, interval_index: usize, run_state: RunState) {
        if self.json {
            return;
        }
        self.close_line();
        let interval = &workout.intervals[interval_index];
        match run_state {
            RunState::Paused => println!("-- paused (p to resume, s to stop) --"),
            _ => println!(
                "== {} {} ({}) ==",
                interval.kind.as_str().to_uppercase(),
                format_clock(interval.duration_secs),
                workout.interval_counter(interval_index)
            ),
        }
    }

    fn show_completion(&mut self, summary: &CompletionSummary) {
        if self.json {
            if let Ok(line) = serde_json::to_string(summary) {
                println!("{line}");
            }
            return;
        }
        self.close_line();
        println!(
            "{} complete ({}).",
            summary.label,
            format_clock(summary.total_secs)
        );
        if summary.program_finished {
            println!("{PROGRAM_FINISHED}");
        } else if let Ok(next) = self.program.get(summary.next_index) {
            println!("Next up: {}", next.label);
        }
    }
}

/// One-line workout status, e.g.
/// `RUN      0:42  Interval 3 of 16  elapsed 7:48  [#####...]  27%`.
pub fn status_line(payload: &DisplayPayload) -> String {
    let filled = ((payload.progress_fraction * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let mut line = format!(
        "{:<8} {:>5}  {}  elapsed {}  [{}{}] {:>3}%",
        payload.interval_kind.as_str().to_uppercase(),
        format_clock(payload.remaining_secs),
        payload.interval_counter,
        format_clock(payload.total_elapsed_secs),
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        (payload.progress_fraction * 100.0).floor() as u32,
    );
    if payload.run_state == RunState::Paused {
        line.push_str("  (paused)");
    }
    line
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask a yes/no question on stderr and read the answer from stdin.
/// Anything but "y"/"yes" counts as no.
pub fn confirm(prompt: &str) -> std::io::Result<bool> {
    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

/// Read workout commands from stdin on a background thread.
///
/// `p` (or an empty line) toggles pause, `s` asks to stop. The thread ends
/// when stdin closes or the session stops listening.
pub fn spawn_input_reader(commands: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        while let Some(Ok(line)) = lines.next() {
            let command = match line.trim() {
                "" | "p" | "pause" => SessionCommand::TogglePause,
                "s" | "stop" => {
                    eprint!("{STOP_PROMPT} [y/N] ");
                    let _ = std::io::stderr().flush();
                    let confirmed = matches!(lines.next(), Some(Ok(answer)) if is_yes(&answer));
                    SessionCommand::Stop { confirmed }
                }
                other => {
                    eprintln!("unknown command '{other}' (p = pause/resume, s = stop)");
                    continue;
                }
            };
            if commands.blocking_send(command).is_err() {
                break;
            }
        }
        tracing::debug!("input reader finished");
    });
}
