//! Text-to-speech through an external synthesizer program.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// Speech synthesizer. `speak` must cut off anything still playing; cues
/// are never queued.
pub trait SpeechBackend: Send {
    fn speak(&mut self, text: &str) -> std::io::Result<()>;
    fn cancel(&mut self);
}

/// Synthesizers tried in order when none is configured.
const CANDIDATES: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

/// Runs one synthesizer process per cue, killing the previous one first.
#[derive(Debug)]
pub struct CommandSpeech {
    program: PathBuf,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current: None,
        }
    }

    /// Find a synthesizer.
    ///
    /// `preferred` is a command line such as `"espeak-ng -s 150"`; when it is
    /// missing or cannot be found on `PATH`, the usual synthesizers are tried.
    pub fn detect(preferred: Option<&str>) -> Option<Self> {
        if let Some(command) = preferred {
            let mut parts = command.split_whitespace();
            if let Some(name) = parts.next() {
                match which::which(name) {
                    Ok(path) => return Some(Self::new(path, parts.map(String::from).collect())),
                    Err(e) => tracing::warn!(command = name, error = %e, "configured voice command not found"),
                }
            }
        }
        CANDIDATES.iter().find_map(|name| {
            which::which(name).ok().map(|path| {
                tracing::debug!(synthesizer = %path.display(), "speech synthesizer detected");
                Self::new(path, Vec::new())
            })
        })
    }

    pub fn is_speaking(&mut self) -> bool {
        matches!(
            self.current.as_mut().map(|child| child.try_wait()),
            Some(Ok(None))
        )
    }
}

impl SpeechBackend for CommandSpeech {
    fn speak(&mut self, text: &str) -> std::io::Result<()> {
        self.cancel();
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        self.current = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(child) = self.current.take() {
            super::stop_child(child);
        }
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}
