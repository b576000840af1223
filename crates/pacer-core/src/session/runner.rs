//! Orchestration loop.
//!
//! Waits on user commands and timer notifications and hands them to the
//! controller one at a time. Nothing else ever touches the controller while
//! the loop runs, so a boundary can only be announced once.

use tokio::sync::mpsc;

use super::controller::{SessionController, SessionPhase};
use crate::events::SessionEvent;
use crate::timer::TimerNotification;

/// User input accepted while a workout is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    TogglePause,
    /// `confirmed` is the user's answer to the stop prompt.
    Stop { confirmed: bool },
}

/// Drive the active session until it completes or is stopped.
///
/// Every event the controller produces is passed to `on_event`. Returns the
/// phase the controller ended in. If `commands` closes, the workout keeps
/// running on timer notifications alone.
pub async fn run_session<F>(
    controller: &mut SessionController,
    notifications: &mut mpsc::UnboundedReceiver<TimerNotification>,
    commands: &mut mpsc::Receiver<SessionCommand>,
    mut on_event: F,
) -> SessionPhase
where
    F: FnMut(&SessionEvent),
{
    let mut commands_open = true;

    while controller.is_active() {
        let event = tokio::select! {
            biased;
            cmd = commands.recv(), if commands_open => match cmd {
                Some(SessionCommand::TogglePause) => controller.toggle_pause(),
                Some(SessionCommand::Stop { confirmed }) => controller.stop_workout(confirmed),
                None => {
                    tracing::debug!("command channel closed");
                    commands_open = false;
                    None
                }
            },
            notification = notifications.recv() => match notification {
                Some(n) => controller.handle_notification(n),
                None => break,
            },
        };
        if let Some(event) = event {
            on_event(&event);
        }
    }

    controller.phase()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::session::{Collaborators, CueSink, DisplayPayload, DisplaySink, NoKeepAlive};
    use crate::storage::{Database, SqliteProgressStore};
    use crate::Program;

    struct SharedCues(Arc<Mutex<Vec<String>>>);
    impl CueSink for SharedCues {
        fn unlock(&mut self) {}
        fn speak(&mut self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    struct NullDisplay;
    impl DisplaySink for NullDisplay {
        fn render(&mut self, _payload: &DisplayPayload) {}
    }

    fn controller() -> (
        SessionController,
        mpsc::UnboundedReceiver<TimerNotification>,
        Arc<Mutex<Vec<String>>>,
    ) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let collaborators = Collaborators {
            progress: Box::new(SqliteProgressStore::new(Database::open_memory().unwrap())),
            cues: Box::new(SharedCues(spoken.clone())),
            keep_alive: Box::new(NoKeepAlive),
            display: Box::new(NullDisplay),
        };
        let (c, rx) = SessionController::new(
            Program::couch_to_5k(),
            collaborators,
            Duration::from_millis(250),
        );
        (c, rx, spoken)
    }

    #[tokio::test(start_paused = true)]
    async fn testing_workout_runs_to_completion_on_the_real_engine() {
        let (mut c, mut rx, spoken) = controller();
        let (_tx, mut commands) = mpsc::channel(8);
        c.start_workout(27).unwrap();

        let mut changes = 0;
        let phase = run_session(&mut c, &mut rx, &mut commands, |e| {
            if matches!(e, SessionEvent::IntervalChanged { .. }) {
                changes += 1;
            }
        })
        .await;

        assert_eq!(phase, SessionPhase::Complete { workout_index: 27 });
        // Twelve ten-second intervals, eleven boundaries.
        assert_eq!(changes, 11);
        let spoken = spoken.lock().unwrap();
        assert_eq!(spoken.len(), 13);
        assert_eq!(spoken[0], "Workout starting. Test.");
        assert_eq!(spoken[10], "Last run. Finish strong.");
        assert_eq!(spoken[12], "Workout complete. Great job.");
        assert!(c.progress().is_completed(27));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_command_ends_the_session_without_progress() {
        let (mut c, mut rx, _spoken) = controller();
        let (tx, mut commands) = mpsc::channel(8);
        c.start_workout(0).unwrap();

        tx.send(SessionCommand::Stop { confirmed: false }).await.unwrap();
        tx.send(SessionCommand::TogglePause).await.unwrap();
        tx.send(SessionCommand::Stop { confirmed: true }).await.unwrap();

        let mut events = Vec::new();
        let phase = run_session(&mut c, &mut rx, &mut commands, |e| events.push(e.clone())).await;

        assert_eq!(phase, SessionPhase::Idle);
        assert!(matches!(events[0], SessionEvent::SessionPaused { .. }));
        assert!(matches!(events.last(), Some(SessionEvent::WorkoutStopped { .. })));
        assert!(c.progress().completed_workouts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn paused_time_does_not_count_toward_the_workout() {
        let (mut c, mut rx, _spoken) = controller();
        let (tx, mut commands) = mpsc::channel(8);
        c.start_workout(27).unwrap();

        let driver = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            tx.send(SessionCommand::TogglePause).await.unwrap();
            tokio::time::sleep(Duration::from_secs(600)).await;
            tx.send(SessionCommand::TogglePause).await.unwrap();
            tx
        });

        let started = tokio::time::Instant::now();
        let phase = run_session(&mut c, &mut rx, &mut commands, |_| {}).await;
        let wall = started.elapsed();
        let _tx = driver.await.unwrap();

        assert_eq!(phase, SessionPhase::Complete { workout_index: 27 });
        // 120 s of workout plus the 600 s pause.
        assert!(wall >= Duration::from_secs(720));
        assert!(wall < Duration::from_secs(722));
    }
}
