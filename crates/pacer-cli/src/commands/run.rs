use clap::Args;
use pacer_core::session::{self, CueSink, KeepAlive};
use pacer_core::{
    Collaborators, Config, CueOutput, KeepAwake, Program, SessionController, SessionEvent,
    SessionPhase,
};
use tokio::sync::mpsc;

use super::{open_progress, CmdResult};
use crate::terminal::{self, TerminalDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Workout index (defaults to the next one not yet completed)
    pub index: Option<usize>,
    /// Emit display frames and events as newline-delimited JSON
    #[arg(long)]
    pub json: bool,
    /// No speech or pulses
    #[arg(long)]
    pub silent: bool,
    /// Let the machine sleep during the workout
    #[arg(long)]
    pub no_keep_awake: bool,
}

pub fn run(args: RunArgs) -> CmdResult {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_workout(args, config))
}

async fn run_workout(args: RunArgs, config: Config) -> CmdResult {
    let program = Program::couch_to_5k();
    let json = args.json || config.display.json;

    let cues: Box<dyn CueSink> = if args.silent {
        Box::new(CueOutput::new(None, false))
    } else {
        Box::new(CueOutput::from_config(&config.cues))
    };
    let keep_alive: Box<dyn KeepAlive> = if args.no_keep_awake || !config.keepalive.enabled {
        Box::new(KeepAwake::disabled())
    } else {
        Box::new(KeepAwake::detect())
    };
    let collaborators = Collaborators {
        progress: Box::new(open_progress()?),
        cues,
        keep_alive,
        display: Box::new(TerminalDisplay::new(program.clone(), json)),
    };

    let (mut controller, mut notifications) =
        SessionController::new(program, collaborators, config.timer.cadence());
    let index = args
        .index
        .unwrap_or_else(|| controller.next_workout_index());
    // Range-check here: start_workout treats a bad index as a caller bug.
    let label = controller.program().get(index)?.label.clone();

    let (command_tx, mut commands) = mpsc::channel(16);
    terminal::spawn_input_reader(command_tx);

    let on_event = |event: &SessionEvent| {
        if json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        } else if let SessionEvent::IntervalChanged { announced, .. } = event {
            tracing::info!(%announced, "interval changed");
        }
    };

    if !json {
        println!("{label} -- p: pause/resume, s: stop");
    }
    let started = controller.start_workout(index)?;
    on_event(&started);

    let phase = session::run_session(&mut controller, &mut notifications, &mut commands, on_event).await;
    if phase == SessionPhase::Idle && !json {
        println!("\nWorkout stopped. Progress not saved.");
    }
    Ok(())
}
