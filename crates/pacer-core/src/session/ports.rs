use crate::program::WorkoutDefinition;
use crate::storage::ProgressRecord;
use crate::timer::RunState;

use super::display::{CompletionSummary, DisplayPayload};

/// Completion history. Implementations never fail: storage problems are
/// handled (and logged) on their side.
pub trait ProgressStore: Send {
    /// Current record, or defaults when nothing valid is stored.
    fn load(&self) -> ProgressRecord;

    /// Union-insert `ordinal`, stamp today's date, persist, return the result.
    fn mark_complete(&mut self, ordinal: usize) -> ProgressRecord;

    /// Forget all progress.
    fn reset(&mut self);

    fn next_incomplete_index(&self, total: usize) -> usize {
        self.load().next_incomplete_index(total)
    }
}

/// Spoken or tonal announcements.
pub trait CueSink: Send {
    /// Prime the output device. Called from a user-initiated action.
    fn unlock(&mut self);

    /// Announce `text` now, cutting off anything still playing.
    fn speak(&mut self, text: &str);
}

/// Keeps the host from suspending us while a workout runs.
pub trait KeepAlive: Send {
    fn start_keep_alive(&mut self);
    fn stop_keep_alive(&mut self);
}

/// Presentation layer. The controller only ever pushes values here.
pub trait DisplaySink: Send {
    /// Called on every tick while active.
    fn render(&mut self, payload: &DisplayPayload);

    /// Called when the active interval or run state changes.
    fn restyle(&mut self, _workout: &WorkoutDefinition, _interval_index: usize, _run_state: RunState) {
        // default no-op
    }

    /// Called once when a workout finishes.
    fn show_completion(&mut self, _summary: &CompletionSummary) {
        // default no-op
    }
}

/// Keep-alive that does nothing, for hosts that never suspend.
#[derive(Debug, Default)]
pub struct NoKeepAlive;

impl KeepAlive for NoKeepAlive {
    fn start_keep_alive(&mut self) {}
    fn stop_keep_alive(&mut self) {}
}
