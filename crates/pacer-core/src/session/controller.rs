//! Session state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Active(running <-> paused) -> Complete
//!           |
//!           +-- stop --> Idle
//! ```
//!
//! The controller owns the timer engine for the current attempt. Each engine
//! it spawns gets a fresh generation number, and any notification that does
//! not carry the current generation (or arrives while not active) is dropped,
//! so a late tick from a torn-down engine can never revive a session.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::display::{CompletionSummary, DisplayPayload};
use super::ports::{CueSink, DisplaySink, KeepAlive, ProgressStore};
use crate::error::ValidationError;
use crate::events::SessionEvent;
use crate::program::{IntervalKind, Program, WorkoutDefinition};
use crate::storage::ProgressRecord;
use crate::timer::{
    resolver, RunState, TimerCommand, TimerEngine, TimerHandle, TimerNotification, TimerSnapshot,
};

const START_ANNOUNCEMENT: &str = "Workout starting.";
const FINAL_RUN_ANNOUNCEMENT: &str = "Last run. Finish strong.";
const COMPLETE_ANNOUNCEMENT: &str = "Workout complete. Great job.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Active {
        workout_index: usize,
        interval_index: usize,
        run_state: RunState,
    },
    Complete {
        workout_index: usize,
    },
}

/// The outside world, as seen by the controller.
pub struct Collaborators {
    pub progress: Box<dyn ProgressStore>,
    pub cues: Box<dyn CueSink>,
    pub keep_alive: Box<dyn KeepAlive>,
    pub display: Box<dyn DisplaySink>,
}

pub struct SessionController {
    program: Program,
    collaborators: Collaborators,
    cadence: Duration,
    notify: mpsc::UnboundedSender<TimerNotification>,
    timer: Option<TimerHandle>,
    generation: u64,
    phase: SessionPhase,
    last_snapshot: TimerSnapshot,
    last_completion: Option<CompletionSummary>,
}

impl SessionController {
    /// Create an idle controller.
    ///
    /// Returns the receiving end of the timer notification channel; feed
    /// everything it yields back into [`Self::handle_notification`], one at a
    /// time (see [`super::run_session`]).
    pub fn new(
        program: Program,
        collaborators: Collaborators,
        cadence: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<TimerNotification>) {
        let (notify, notifications) = mpsc::unbounded_channel();
        let controller = Self {
            program,
            collaborators,
            cadence,
            notify,
            timer: None,
            generation: 0,
            phase: SessionPhase::Idle,
            last_snapshot: TimerSnapshot {
                elapsed_ms: 0,
                state: RunState::Stopped,
            },
            last_completion: None,
        };
        (controller, notifications)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, SessionPhase::Active { .. })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Generation of the engine currently driving the session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&self) -> ProgressRecord {
        self.collaborators.progress.load()
    }

    /// The workout to offer next: the first one not yet completed.
    pub fn next_workout_index(&self) -> usize {
        self.collaborators
            .progress
            .next_incomplete_index(self.program.len())
    }

    pub fn last_completion(&self) -> Option<&CompletionSummary> {
        self.last_completion.as_ref()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh attempt at `workout_index`.
    ///
    /// Must be called from a user-initiated action: it unlocks the cue output.
    /// Starting while another attempt is active tears that attempt down first.
    ///
    /// # Errors
    /// Returns [`ValidationError::OutOfBounds`] if `workout_index` is not in
    /// the program. That is a caller bug and is also caught by a debug
    /// assertion.
    pub fn start_workout(&mut self, workout_index: usize) -> Result<SessionEvent, ValidationError> {
        debug_assert!(
            workout_index < self.program.len(),
            "workout index {workout_index} outside program of {}",
            self.program.len()
        );
        let workout = self.program.get(workout_index)?;
        let label = workout.label.clone();
        let total_secs = workout.total_duration_secs();
        let first_cue = workout.intervals[0].cue.clone();

        self.teardown_timer();

        self.collaborators.cues.unlock();
        self.collaborators.keep_alive.start_keep_alive();

        self.generation += 1;
        let timer = TimerEngine::spawn(self.generation, self.cadence, self.notify.clone());
        timer.send(TimerCommand::Start);
        self.timer = Some(timer);

        self.phase = SessionPhase::Active {
            workout_index,
            interval_index: 0,
            run_state: RunState::Running,
        };
        self.last_snapshot = TimerSnapshot {
            elapsed_ms: 0,
            state: RunState::Running,
        };
        self.last_completion = None;

        let workout = &self.program.workouts[workout_index];
        self.collaborators
            .display
            .restyle(workout, 0, RunState::Running);
        self.collaborators
            .display
            .render(&DisplayPayload::new(workout, 0, 0.0, RunState::Running));
        self.collaborators
            .cues
            .speak(&format!("{START_ANNOUNCEMENT} {first_cue}"));

        tracing::info!(
            workout_index,
            %label,
            generation = self.generation,
            "workout started"
        );
        Ok(SessionEvent::WorkoutStarted {
            workout_index,
            label,
            total_secs,
            at: Utc::now(),
        })
    }

    /// Process one engine notification.
    pub fn handle_notification(&mut self, notification: TimerNotification) -> Option<SessionEvent> {
        if self.timer.is_none() || notification.generation() != self.generation {
            tracing::debug!(
                got = notification.generation(),
                current = self.generation,
                "discarding stale timer notification"
            );
            return None;
        }
        let SessionPhase::Active {
            workout_index,
            interval_index,
            run_state,
        } = self.phase
        else {
            return None;
        };

        match notification {
            // Run state is set by pause/resume; the engine's echo of an
            // earlier command may arrive after a newer one.
            TimerNotification::StateChanged { state, .. } => {
                tracing::trace!(engine = %state.as_str(), session = %run_state.as_str(), "engine state echo");
                None
            }
            TimerNotification::Tick { snapshot, .. } => {
                self.last_snapshot = snapshot;
                let elapsed = snapshot.elapsed_secs();
                let workout = &self.program.workouts[workout_index];
                let resolution = resolver::resolve_active_interval(workout, elapsed);

                if resolution.is_past_end {
                    return Some(self.complete(workout_index));
                }

                let mut event = None;
                if resolution.index > interval_index {
                    let announced = announcement(workout, resolution.index);
                    let kind = workout.intervals[resolution.index].kind;
                    self.phase = SessionPhase::Active {
                        workout_index,
                        interval_index: resolution.index,
                        run_state,
                    };
                    self.collaborators.cues.speak(&announced);
                    self.collaborators
                        .display
                        .restyle(workout, resolution.index, run_state);
                    tracing::info!(
                        workout_index,
                        interval_index = resolution.index,
                        %kind,
                        "interval changed"
                    );
                    event = Some(SessionEvent::IntervalChanged {
                        workout_index,
                        interval_index: resolution.index,
                        kind,
                        announced,
                        at: Utc::now(),
                    });
                }

                let current = match self.phase {
                    SessionPhase::Active { interval_index, .. } => interval_index,
                    _ => interval_index,
                };
                self.collaborators
                    .display
                    .render(&DisplayPayload::new(workout, current, elapsed, run_state));
                event
            }
        }
    }

    pub fn pause(&mut self) -> Option<SessionEvent> {
        match self.phase {
            SessionPhase::Active {
                run_state: RunState::Running,
                ..
            } => {
                self.send(TimerCommand::Pause);
                self.set_run_state(RunState::Paused);
                tracing::info!(elapsed_ms = self.last_snapshot.elapsed_ms, "session paused");
                Some(SessionEvent::SessionPaused {
                    elapsed_ms: self.last_snapshot.elapsed_ms,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<SessionEvent> {
        match self.phase {
            SessionPhase::Active {
                run_state: RunState::Paused,
                ..
            } => {
                self.send(TimerCommand::Resume);
                self.set_run_state(RunState::Running);
                tracing::info!(elapsed_ms = self.last_snapshot.elapsed_ms, "session resumed");
                Some(SessionEvent::SessionResumed {
                    elapsed_ms: self.last_snapshot.elapsed_ms,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn toggle_pause(&mut self) -> Option<SessionEvent> {
        match self.phase {
            SessionPhase::Active {
                run_state: RunState::Running,
                ..
            } => self.pause(),
            SessionPhase::Active {
                run_state: RunState::Paused,
                ..
            } => self.resume(),
            _ => None,
        }
    }

    /// Abandon the active attempt without recording progress.
    ///
    /// `confirmed` is the user's answer to the "progress won't be saved"
    /// prompt; a declined stop leaves the session untouched.
    pub fn stop_workout(&mut self, confirmed: bool) -> Option<SessionEvent> {
        let SessionPhase::Active { workout_index, .. } = self.phase else {
            return None;
        };
        if !confirmed {
            tracing::info!(workout_index, "stop declined");
            return None;
        }

        self.teardown_timer();
        self.collaborators.keep_alive.stop_keep_alive();
        self.phase = SessionPhase::Idle;

        tracing::info!(
            workout_index,
            elapsed_ms = self.last_snapshot.elapsed_ms,
            "workout stopped"
        );
        Some(SessionEvent::WorkoutStopped {
            workout_index,
            elapsed_ms: self.last_snapshot.elapsed_ms,
            at: Utc::now(),
        })
    }

    /// Clear all recorded progress. Refused while a workout is active.
    pub fn reset_progress(&mut self, confirmed: bool) -> Option<SessionEvent> {
        if self.is_active() {
            tracing::warn!("progress reset refused during an active workout");
            return None;
        }
        if !confirmed {
            tracing::info!("progress reset declined");
            return None;
        }
        self.collaborators.progress.reset();
        self.phase = SessionPhase::Idle;
        self.last_completion = None;
        Some(SessionEvent::ProgressReset { at: Utc::now() })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, workout_index: usize) -> SessionEvent {
        self.teardown_timer();
        self.collaborators.keep_alive.stop_keep_alive();
        self.collaborators.cues.speak(COMPLETE_ANNOUNCEMENT);

        let record = self.collaborators.progress.mark_complete(workout_index);
        let total = self.program.len();
        let workout = &self.program.workouts[workout_index];
        let summary = CompletionSummary {
            workout_index,
            label: workout.label.clone(),
            total_secs: workout.total_duration_secs(),
            next_index: record.next_incomplete_index(total),
            program_finished: record.all_complete(total),
        };

        self.phase = SessionPhase::Complete { workout_index };
        self.collaborators.display.show_completion(&summary);
        tracing::info!(
            workout_index,
            next_index = summary.next_index,
            program_finished = summary.program_finished,
            "workout complete"
        );

        let event = SessionEvent::WorkoutCompleted {
            workout_index,
            next_index: summary.next_index,
            program_finished: summary.program_finished,
            at: Utc::now(),
        };
        self.last_completion = Some(summary);
        event
    }

    fn set_run_state(&mut self, state: RunState) {
        if let SessionPhase::Active {
            workout_index,
            interval_index,
            ..
        } = self.phase
        {
            self.phase = SessionPhase::Active {
                workout_index,
                interval_index,
                run_state: state,
            };
            let workout = &self.program.workouts[workout_index];
            self.collaborators
                .display
                .restyle(workout, interval_index, state);
        }
    }

    fn send(&self, cmd: TimerCommand) {
        if let Some(timer) = &self.timer {
            if !timer.send(cmd) {
                tracing::warn!(?cmd, "timer engine is gone");
            }
        }
    }

    /// Halt the engine before any state change, so nothing it already queued
    /// can be mistaken for the next attempt's ticks.
    fn teardown_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.shutdown();
        }
    }
}

/// Text to announce on entering `index`.
///
/// A run with no later run in the workout gets the final-run announcement
/// instead of its own cue.
pub fn announcement(workout: &WorkoutDefinition, index: usize) -> String {
    let interval = &workout.intervals[index];
    let is_last_run = interval.kind == IntervalKind::Run
        && !workout.intervals[index + 1..]
            .iter()
            .any(|iv| iv.kind == IntervalKind::Run);
    if is_last_run {
        FINAL_RUN_ANNOUNCEMENT.to_string()
    } else {
        interval.cue.clone()
    }
}
