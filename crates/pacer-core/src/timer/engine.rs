//! Background timer engine.
//!
//! The engine owns an [`ElapsedClock`] inside its own tokio task, so its
//! cadence is unaffected by whatever the consumer is doing. It talks to the
//! outside world only through channels:
//!
//! ```text
//! TimerHandle --TimerCommand--> engine task --TimerNotification--> consumer
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let handle = TimerEngine::spawn(1, DEFAULT_CADENCE, tx);
//! handle.send(TimerCommand::Start);
//! while let Some(notification) = rx.recv().await { /* ... */ }
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::clock::ElapsedClock;
use super::{RunState, TimerCommand, TimerNotification};

/// Coarse enough to be cheap, fine enough for whole-second display rounding.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(250);

/// Engine state, moved into its task by [`TimerEngine::spawn`].
pub struct TimerEngine {
    generation: u64,
    cadence: Duration,
    clock: ElapsedClock,
    notify: mpsc::UnboundedSender<TimerNotification>,
}

impl TimerEngine {
    /// Spawn an engine on the current tokio runtime.
    ///
    /// The engine starts out stopped; send [`TimerCommand::Start`] to begin.
    pub fn spawn(
        generation: u64,
        cadence: Duration,
        notify: mpsc::UnboundedSender<TimerNotification>,
    ) -> TimerHandle {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let engine = Self {
            generation,
            cadence: cadence.max(Duration::from_millis(1)),
            clock: ElapsedClock::new(),
            notify,
        };
        let task = tokio::spawn(engine.run(command_rx));
        tracing::debug!(generation, ?cadence, "timer engine spawned");
        TimerHandle {
            generation,
            commands,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<TimerCommand>) {
        let mut ticker = tokio::time::interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        if !self.apply(cmd, &mut ticker) {
                            break;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick(), if self.clock.state() == RunState::Running => {
                    if !self.emit_tick(Instant::now()) {
                        break;
                    }
                }
            }
        }
        tracing::debug!(generation = self.generation, "timer engine stopped");
    }

    /// Apply one command. Returns `false` once the consumer has gone away.
    fn apply(&mut self, cmd: TimerCommand, ticker: &mut Interval) -> bool {
        let now = Instant::now();
        match cmd {
            TimerCommand::Start => {
                self.clock.start(now);
                ticker.reset();
                self.emit_state(RunState::Running) && self.emit_tick(now)
            }
            TimerCommand::Pause => {
                if self.clock.pause(now) {
                    self.emit_state(RunState::Paused)
                } else {
                    true
                }
            }
            TimerCommand::Resume => {
                if self.clock.resume(now) {
                    ticker.reset();
                    self.emit_state(RunState::Running) && self.emit_tick(now)
                } else {
                    true
                }
            }
            TimerCommand::Reset => {
                self.clock.reset();
                self.emit_state(RunState::Stopped)
            }
        }
    }

    fn emit_tick(&self, now: Instant) -> bool {
        let snapshot = self.clock.snapshot(now);
        tracing::trace!(generation = self.generation, elapsed_ms = snapshot.elapsed_ms, "tick");
        self.notify
            .send(TimerNotification::Tick {
                generation: self.generation,
                snapshot,
            })
            .is_ok()
    }

    fn emit_state(&self, state: RunState) -> bool {
        self.notify
            .send(TimerNotification::StateChanged {
                generation: self.generation,
                state,
            })
            .is_ok()
    }
}

/// Owner's side of a spawned [`TimerEngine`].
///
/// Dropping the handle aborts the engine task.
#[derive(Debug)]
pub struct TimerHandle {
    generation: u64,
    commands: mpsc::UnboundedSender<TimerCommand>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue a command. Returns `false` if the engine is no longer running.
    pub fn send(&self, cmd: TimerCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// Halt the engine. After this returns the task is cancelled and will not
    /// be polled again, so it cannot emit further notifications.
    pub fn shutdown(self) {
        tracing::debug!(generation = self.generation, "timer engine shutdown");
        // Drop does the abort.
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Let the engine task process everything queued so far.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerNotification>) -> Vec<TimerNotification> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    fn last_elapsed(notifications: &[TimerNotification]) -> Option<u64> {
        notifications.iter().rev().find_map(|n| match n {
            TimerNotification::Tick { snapshot, .. } => Some(snapshot.elapsed_ms),
            _ => None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn start_emits_running_then_immediate_tick() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TimerEngine::spawn(7, DEFAULT_CADENCE, tx);
        handle.send(TimerCommand::Start);
        settle().await;

        let got = drain(&mut rx);
        assert_eq!(
            got,
            vec![
                TimerNotification::StateChanged {
                    generation: 7,
                    state: RunState::Running
                },
                TimerNotification::Tick {
                    generation: 7,
                    snapshot: crate::timer::TimerSnapshot {
                        elapsed_ms: 0,
                        state: RunState::Running
                    }
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_the_cadence() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TimerEngine::spawn(1, DEFAULT_CADENCE, tx);
        handle.send(TimerCommand::Start);
        settle().await;
        drain(&mut rx);

        for step in 1..=4u64 {
            tokio::time::advance(ms(250)).await;
            settle().await;
            let got = drain(&mut rx);
            assert_eq!(got.len(), 1);
            assert_eq!(last_elapsed(&got), Some(step * 250));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pause_excludes_paused_wall_clock_time() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TimerEngine::spawn(1, DEFAULT_CADENCE, tx);
        handle.send(TimerCommand::Start);
        settle().await;
        tokio::time::advance(ms(3_000)).await;
        settle().await;

        handle.send(TimerCommand::Pause);
        settle().await;
        assert_eq!(last_elapsed(&drain(&mut rx)), Some(3_000));

        // Nothing is emitted while paused.
        tokio::time::advance(ms(60_000)).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());

        handle.send(TimerCommand::Resume);
        settle().await;
        let got = drain(&mut rx);
        assert_eq!(
            got[0],
            TimerNotification::StateChanged {
                generation: 1,
                state: RunState::Running
            }
        );
        assert_eq!(last_elapsed(&got), Some(3_000));

        tokio::time::advance(ms(500)).await;
        settle().await;
        assert_eq!(last_elapsed(&drain(&mut rx)), Some(3_500));
    }

    #[tokio::test(start_paused = true)]
    async fn redundant_commands_are_silent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TimerEngine::spawn(1, DEFAULT_CADENCE, tx);
        handle.send(TimerCommand::Pause);
        handle.send(TimerCommand::Resume);
        settle().await;
        assert!(drain(&mut rx).is_empty());

        handle.send(TimerCommand::Start);
        handle.send(TimerCommand::Resume);
        settle().await;
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_emits_stopped_and_halts_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TimerEngine::spawn(3, DEFAULT_CADENCE, tx);
        handle.send(TimerCommand::Start);
        handle.send(TimerCommand::Reset);
        settle().await;
        let got = drain(&mut rx);
        assert_eq!(
            got.last(),
            Some(&TimerNotification::StateChanged {
                generation: 3,
                state: RunState::Stopped
            })
        );

        tokio::time::advance(ms(2_000)).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_all_notifications() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = TimerEngine::spawn(1, DEFAULT_CADENCE, tx);
        handle.send(TimerCommand::Start);
        settle().await;
        drain(&mut rx);

        handle.shutdown();
        tokio::time::advance(ms(5_000)).await;
        settle().await;
        assert!(drain(&mut rx).is_empty());
    }
}
