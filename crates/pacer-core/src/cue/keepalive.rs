//! Keeps the machine awake while a workout runs.
//!
//! Holds an idle/sleep inhibitor process for the duration of the workout:
//! `caffeinate` on macOS, `systemd-inhibit` elsewhere. Hosts with neither get
//! a silent no-op.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use crate::session::KeepAlive;

#[derive(Debug)]
pub struct KeepAwake {
    command: Option<(PathBuf, Vec<String>)>,
    child: Option<Child>,
}

impl KeepAwake {
    pub fn detect() -> Self {
        let command = if cfg!(target_os = "macos") {
            which::which("caffeinate")
                .ok()
                .map(|path| (path, vec!["-i".to_string()]))
        } else {
            which::which("systemd-inhibit").ok().map(|path| {
                let args = [
                    "--what=idle:sleep",
                    "--who=pacer",
                    "--why=Workout in progress",
                    "sleep",
                    "infinity",
                ];
                (path, args.iter().map(|s| s.to_string()).collect())
            })
        };
        if command.is_none() {
            tracing::debug!("no sleep inhibitor available");
        }
        Self {
            command,
            child: None,
        }
    }

    pub fn with_command(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            command: Some((program.into(), args)),
            child: None,
        }
    }

    pub fn disabled() -> Self {
        Self {
            command: None,
            child: None,
        }
    }

    pub fn is_holding(&mut self) -> bool {
        matches!(
            self.child.as_mut().map(|child| child.try_wait()),
            Some(Ok(None))
        )
    }
}

impl KeepAlive for KeepAwake {
    fn start_keep_alive(&mut self) {
        if self.is_holding() {
            return;
        }
        let Some((program, args)) = &self.command else {
            return;
        };
        match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                tracing::debug!(pid = child.id(), "keep-awake started");
                self.child = Some(child);
            }
            Err(e) => tracing::warn!(error = %e, "cannot start keep-awake"),
        }
    }

    fn stop_keep_alive(&mut self) {
        if let Some(child) = self.child.take() {
            super::stop_child(child);
            tracing::debug!("keep-awake stopped");
        }
    }
}

impl Drop for KeepAwake {
    fn drop(&mut self) {
        self.stop_keep_alive();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn holds_the_inhibitor_between_start_and_stop() {
        let Ok(sleep) = which::which("sleep") else {
            return;
        };
        let mut guard = KeepAwake::with_command(sleep, vec!["30".into()]);
        guard.start_keep_alive();
        assert!(guard.is_holding());
        guard.start_keep_alive();
        assert!(guard.is_holding());
        guard.stop_keep_alive();
        assert!(!guard.is_holding());
    }

    #[test]
    fn disabled_guard_is_a_noop() {
        let mut guard = KeepAwake::disabled();
        guard.start_keep_alive();
        assert!(!guard.is_holding());
        guard.stop_keep_alive();
    }
}
