//! Timer control commands.
//!
//! The engine is persisted as JSON in the kv store between invocations;
//! `timer run` is the tick source -- it drives the countdown in the
//! foreground at one tick per second until the phase completes.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use clap::Subcommand;

use focusloop_core::{
    CoreError, Event, SessionType, SettingsStore, StatsEngine, Store, TimerEngine, ENGINE_KEY,
};

use super::print_json;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Skip the current phase (not recorded in statistics)
    Skip,
    /// Reset the current phase to its full duration
    Reset,
    /// Print the current timer state as JSON
    Status,
    /// Run the countdown in the foreground until the phase completes
    Run,
}

fn load_engine(store: &Store, settings: &SettingsStore) -> TimerEngine {
    let mut engine = store.get(ENGINE_KEY, TimerEngine::new(settings.get()));
    // Pick up any `config set` issued since the engine was persisted;
    // mid-countdown the change defers to the next transition.
    engine.update_settings(settings.get());
    engine
}

fn save_engine(store: &Store, engine: &TimerEngine) {
    if !store.set(ENGINE_KEY, engine) {
        tracing::warn!("timer state could not be persisted");
    }
}

pub fn run(action: TimerAction) -> Result<(), CoreError> {
    let store = super::open_store();
    let settings = SettingsStore::load(&store);
    let mut engine = load_engine(&store, &settings);

    match action {
        TimerAction::Start | TimerAction::Resume => match engine.start() {
            Some(event) => print_json(&event)?,
            None => print_json(&engine.snapshot())?,
        },
        TimerAction::Pause => match engine.pause() {
            Some(event) => print_json(&event)?,
            None => print_json(&engine.snapshot())?,
        },
        TimerAction::Skip => {
            if let Some(event) = engine.skip() {
                print_json(&event)?;
            }
        }
        TimerAction::Reset => {
            if let Some(event) = engine.reset() {
                print_json(&event)?;
            }
        }
        TimerAction::Status => print_json(&engine.snapshot())?,
        TimerAction::Run => run_foreground(&store, &mut engine)?,
    }

    save_engine(&store, &engine);
    engine.destroy();
    Ok(())
}

enum PhaseOutcome {
    Completed(Event),
    Interrupted,
}

/// Drive the countdown at one tick per second. Completed sessions flow
/// into the statistics engine through the session sink; a completed
/// break or work phase chains into the next one when the corresponding
/// auto-start toggle is on. Ctrl-C pauses and exits.
fn run_foreground(store: &Rc<Store>, engine: &mut TimerEngine) -> Result<(), CoreError> {
    let stats = Rc::new(RefCell::new(StatsEngine::new(Rc::clone(store))));
    {
        let stats = Rc::clone(&stats);
        engine.set_session_sink(move |session| stats.borrow_mut().record_session(&session));
    }

    let settings = engine.settings().clone();
    if settings.notifications_enabled {
        engine.on_complete(|phase| eprintln!("{} finished", phase.label()));
    }
    if settings.sound_enabled {
        engine.on_complete(|_| eprint!("\x07"));
    }

    // Failing to build the interval source is a reported error, not a
    // silent no-op.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| CoreError::Custom(format!("could not schedule the tick source: {e}")))?;

    runtime.block_on(async {
        loop {
            if let Some(event) = engine.start() {
                if print_json(&event).is_err() {
                    break;
                }
            }
            match drive_phase(engine).await {
                PhaseOutcome::Completed(event) => {
                    let _ = print_json(&event);
                    let auto_start = match engine.state().session_type {
                        SessionType::Work => settings.auto_start_work,
                        SessionType::ShortBreak | SessionType::LongBreak => {
                            settings.auto_start_breaks
                        }
                    };
                    if !auto_start {
                        break;
                    }
                }
                PhaseOutcome::Interrupted => {
                    if let Some(event) = engine.pause() {
                        let _ = print_json(&event);
                    }
                    break;
                }
            }
        }
    });

    Ok(())
}

async fn drive_phase(engine: &mut TimerEngine) -> PhaseOutcome {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first interval tick fires immediately; consume it so the
    // countdown starts a full second after `start()`.
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(event @ Event::Completed { .. }) = engine.tick() {
                    return PhaseOutcome::Completed(event);
                }
            }
            _ = tokio::signal::ctrl_c() => return PhaseOutcome::Interrupted,
        }
    }
}
