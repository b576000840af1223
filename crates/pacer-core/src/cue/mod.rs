//! Cue output: speech with a tonal fallback, plus the keep-awake guard.
//!
//! When no speech backend is usable, a cue becomes a short burst of pulses
//! whose count hints at what the cue means:
//!
//! | cue text contains         | pulses |
//! |---------------------------|--------|
//! | "complete" or "cool down" | 3      |
//! | "run"                     | 2      |
//! | anything else             | 1      |

mod keepalive;
mod speech;

use std::io::Write;
use std::process::Child;
use std::time::Duration;

use crate::session::CueSink;
use crate::storage::CuesConfig;

pub use keepalive::KeepAwake;
pub use speech::{CommandSpeech, SpeechBackend};

pub const PULSE_TONE: Duration = Duration::from_millis(150);
pub const PULSE_SPACING: Duration = Duration::from_millis(300);
pub const PULSE_FREQUENCY_HZ: u32 = 880;

/// Number of fallback pulses for a cue.
pub fn classify_pulses(text: &str) -> u8 {
    let lower = text.to_lowercase();
    if lower.contains("complete") || lower.contains("cool down") {
        3
    } else if lower.contains("run") {
        2
    } else {
        1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePlan {
    pub count: u8,
    pub tone: Duration,
    /// Start-to-start distance between pulses.
    pub spacing: Duration,
    pub frequency_hz: u32,
}

impl PulsePlan {
    pub fn for_cue(text: &str) -> Self {
        Self {
            count: classify_pulses(text),
            tone: PULSE_TONE,
            spacing: PULSE_SPACING,
            frequency_hz: PULSE_FREQUENCY_HZ,
        }
    }

    /// Start offset of each pulse relative to the first.
    pub fn offsets(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..u32::from(self.count)).map(|i| self.spacing * i)
    }
}

/// Device that can play a [`PulsePlan`].
pub trait Beeper: Send {
    fn play(&mut self, plan: &PulsePlan);
}

/// Rings the terminal bell once per pulse, off the caller's thread.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Beeper for TerminalBell {
    fn play(&mut self, plan: &PulsePlan) {
        let plan = *plan;
        std::thread::spawn(move || {
            let mut last = Duration::ZERO;
            for offset in plan.offsets() {
                std::thread::sleep(offset - last);
                last = offset;
                let mut err = std::io::stderr().lock();
                let _ = err.write_all(b"\x07");
                let _ = err.flush();
            }
        });
    }
}

/// Kill `child` without waiting for it to exit.
pub(crate) fn stop_child(mut child: Child) {
    if let Ok(None) = child.try_wait() {
        let _ = child.kill();
    }
    reap_in_background(child);
}

/// Collect the exit status off the calling thread so the caller never blocks.
fn reap_in_background(mut child: Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    std::thread::spawn(move || {
        let _ = child.wait();
    });
}

type DeviceFactory = Box<dyn Fn() -> Box<dyn Beeper> + Send>;

/// The cue collaborator used by front ends.
///
/// The pulse device is opened lazily on [`CueSink::unlock`] and released when
/// the output is dropped. A speech backend that fails is dropped for the rest
/// of the session and the fallback takes over.
pub struct CueOutput {
    speech: Option<Box<dyn SpeechBackend>>,
    beep_fallback: bool,
    open_device: DeviceFactory,
    device: Option<Box<dyn Beeper>>,
}

impl CueOutput {
    pub fn new(speech: Option<Box<dyn SpeechBackend>>, beep_fallback: bool) -> Self {
        Self {
            speech,
            beep_fallback,
            open_device: Box::new(|| Box::new(TerminalBell) as Box<dyn Beeper>),
            device: None,
        }
    }

    /// Speech backend and fallback chosen from configuration.
    pub fn from_config(cfg: &CuesConfig) -> Self {
        let speech = if cfg.speech {
            CommandSpeech::detect(cfg.voice_command.as_deref())
                .map(|s| Box::new(s) as Box<dyn SpeechBackend>)
        } else {
            None
        };
        if cfg.speech && speech.is_none() {
            tracing::info!("no speech synthesizer found, using pulse fallback");
        }
        Self::new(speech, cfg.beep_fallback)
    }

    pub fn with_device<F>(mut self, open: F) -> Self
    where
        F: Fn() -> Box<dyn Beeper> + Send + 'static,
    {
        self.open_device = Box::new(open);
        self
    }

    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    fn pulse(&mut self, text: &str) {
        if !self.beep_fallback {
            return;
        }
        match self.device.as_mut() {
            Some(device) => device.play(&PulsePlan::for_cue(text)),
            None => tracing::debug!("cue dropped, output not unlocked yet"),
        }
    }
}

impl CueSink for CueOutput {
    fn unlock(&mut self) {
        if self.device.is_none() {
            self.device = Some((self.open_device)());
            tracing::debug!("cue output unlocked");
        }
    }

    fn speak(&mut self, text: &str) {
        if let Some(speech) = self.speech.as_mut() {
            match speech.speak(text) {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "speech failed, switching to pulses");
                    self.speech = None;
                }
            }
        }
        self.pulse(text);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn pulse_counts_follow_keywords() {
        assert_eq!(classify_pulses("Walk."), 1);
        assert_eq!(classify_pulses("Begin your warm-up walk."), 1);
        assert_eq!(classify_pulses("Start running."), 2);
        assert_eq!(classify_pulses("Last run. Finish strong."), 2);
        assert_eq!(classify_pulses("Cool down. Walk it out."), 3);
        assert_eq!(classify_pulses("Workout complete. Great job."), 3);
        assert_eq!(classify_pulses("RUN then COOL DOWN"), 3);
    }

    #[test]
    fn plan_offsets_are_spaced() {
        let plan = PulsePlan::for_cue("Workout complete.");
        let offsets: Vec<_> = plan.offsets().collect();
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                Duration::from_millis(300),
                Duration::from_millis(600)
            ]
        );
        assert_eq!(plan.tone, Duration::from_millis(150));
    }

    #[derive(Clone, Default)]
    struct Plays(Arc<Mutex<Vec<u8>>>);

    struct FakeBeeper(Plays);
    impl Beeper for FakeBeeper {
        fn play(&mut self, plan: &PulsePlan) {
            self.0 .0.lock().unwrap().push(plan.count);
        }
    }

    struct FailingSpeech;
    impl SpeechBackend for FailingSpeech {
        fn speak(&mut self, _text: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no synthesizer"))
        }
        fn cancel(&mut self) {}
    }

    struct RecordingSpeech(Arc<Mutex<Vec<String>>>);
    impl SpeechBackend for RecordingSpeech {
        fn speak(&mut self, text: &str) -> std::io::Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
        fn cancel(&mut self) {}
    }

    fn output(speech: Option<Box<dyn SpeechBackend>>, plays: &Plays) -> CueOutput {
        let plays = plays.clone();
        CueOutput::new(speech, true).with_device(move || Box::new(FakeBeeper(plays.clone())))
    }

    #[test]
    fn nothing_plays_before_unlock() {
        let plays = Plays::default();
        let mut out = output(None, &plays);
        out.speak("Start running.");
        assert!(plays.0.lock().unwrap().is_empty());

        out.unlock();
        out.speak("Start running.");
        assert_eq!(*plays.0.lock().unwrap(), vec![2]);
    }

    #[test]
    fn speech_is_used_when_available() {
        let plays = Plays::default();
        let said = Arc::new(Mutex::new(Vec::new()));
        let mut out = output(Some(Box::new(RecordingSpeech(said.clone()))), &plays);
        out.unlock();
        out.speak("Walk.");
        assert_eq!(*said.lock().unwrap(), vec!["Walk."]);
        assert!(plays.0.lock().unwrap().is_empty());
    }

    #[test]
    fn failing_speech_falls_back_to_pulses() {
        let plays = Plays::default();
        let mut out = output(Some(Box::new(FailingSpeech)), &plays);
        out.unlock();
        out.speak("Workout complete. Great job.");
        assert!(!out.has_speech());
        out.speak("Walk.");
        assert_eq!(*plays.0.lock().unwrap(), vec![3, 1]);
    }

    #[cfg(unix)]
    #[test]
    fn reaping_does_not_wait_for_the_child() {
        let Ok(sleep) = which::which("sleep") else {
            return;
        };
        let child = std::process::Command::new(sleep).arg("2").spawn().unwrap();
        let begun = std::time::Instant::now();
        reap_in_background(child);
        assert!(begun.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn fallback_can_be_disabled() {
        let plays = Plays::default();
        let mut out = CueOutput::new(None, false).with_device({
            let plays = plays.clone();
            move || Box::new(FakeBeeper(plays.clone()))
        });
        out.unlock();
        out.speak("Start running.");
        assert!(plays.0.lock().unwrap().is_empty());
    }
}
