//! Banked-time elapsed clock.
//!
//! Elapsed time is always recomputed from absolute instants:
//!
//! ```text
//! running: elapsed = (now - started_at) + banked
//! paused:  elapsed = banked
//! ```
//!
//! so scheduling jitter between ticks never accumulates.
//!
//! The clock takes `now` as an argument and owns no thread; [`super::TimerEngine`]
//! drives it from its own task.

use std::time::Duration;

use tokio::time::Instant;

use super::{RunState, TimerSnapshot};

#[derive(Debug, Clone)]
pub struct ElapsedClock {
    state: RunState,
    /// When the current running stretch began.
    started_at: Option<Instant>,
    /// Time accumulated before the current running stretch.
    banked: Duration,
}

impl ElapsedClock {
    pub fn new() -> Self {
        Self {
            state: RunState::Stopped,
            started_at: None,
            banked: Duration::ZERO,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Start from zero. Restarts clean when already running or paused.
    pub fn start(&mut self, now: Instant) {
        self.banked = Duration::ZERO;
        self.started_at = Some(now);
        self.state = RunState::Running;
    }

    /// Fold the current stretch into banked time. Returns `false` (no-op)
    /// unless running.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        if let Some(started) = self.started_at.take() {
            self.banked += now.saturating_duration_since(started);
        }
        self.state = RunState::Paused;
        true
    }

    /// Begin a new running stretch, keeping banked time. Returns `false`
    /// (no-op) unless paused.
    pub fn resume(&mut self, now: Instant) -> bool {
        if self.state != RunState::Paused {
            return false;
        }
        self.started_at = Some(now);
        self.state = RunState::Running;
        true
    }

    pub fn reset(&mut self) {
        self.state = RunState::Stopped;
        self.started_at = None;
        self.banked = Duration::ZERO;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();
        self.banked + running
    }

    pub fn snapshot(&self, now: Instant) -> TimerSnapshot {
        TimerSnapshot {
            elapsed_ms: self.elapsed(now).as_millis() as u64,
            state: self.state,
        }
    }
}

impl Default for ElapsedClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn running_elapsed_is_measured_from_start() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        assert_eq!(clock.elapsed(t0 + ms(1_500)).as_millis(), 1_500);
        assert_eq!(clock.snapshot(t0 + ms(1_500)).state, RunState::Running);
    }

    #[test]
    fn paused_time_is_excluded() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        assert!(clock.pause(t0 + ms(4_000)));

        // Frozen while paused, however long the pause lasts.
        assert_eq!(clock.elapsed(t0 + ms(90_000)).as_millis(), 4_000);

        assert!(clock.resume(t0 + ms(90_000)));
        assert_eq!(clock.elapsed(t0 + ms(90_000)).as_millis(), 4_000);
        assert_eq!(clock.elapsed(t0 + ms(91_250)).as_millis(), 5_250);
    }

    #[test]
    fn repeated_pause_resume_accumulates_banked_time() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        clock.pause(t0 + ms(1_000));
        clock.resume(t0 + ms(5_000));
        clock.pause(t0 + ms(6_000));
        clock.resume(t0 + ms(10_000));
        assert_eq!(clock.elapsed(t0 + ms(10_500)).as_millis(), 2_500);
    }

    #[test]
    fn pause_and_resume_are_noops_in_wrong_state() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        assert!(!clock.pause(t0));
        assert!(!clock.resume(t0));

        clock.start(t0);
        assert!(!clock.resume(t0 + ms(10)));
        assert!(clock.pause(t0 + ms(20)));
        assert!(!clock.pause(t0 + ms(30)));
        assert_eq!(clock.elapsed(t0 + ms(30)).as_millis(), 20);
    }

    #[test]
    fn start_while_running_restarts_clean() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        clock.pause(t0 + ms(3_000));
        clock.start(t0 + ms(4_000));
        assert_eq!(clock.elapsed(t0 + ms(4_100)).as_millis(), 100);
    }

    #[test]
    fn reset_zeroes_everything() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        clock.reset();
        assert_eq!(clock.state(), RunState::Stopped);
        assert_eq!(clock.elapsed(t0 + ms(5_000)), Duration::ZERO);
    }
}
