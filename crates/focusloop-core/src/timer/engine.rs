//! Timer engine implementation.
//!
//! The timer engine is a caller-driven state machine: it owns the single
//! authoritative countdown and decides phase transitions, but it does not
//! use internal threads -- the caller invokes `tick()` once per second of
//! running activity.
//!
//! ## State
//!
//! A phase (`Work`, `ShortBreak`, `LongBreak`) crossed with an activity
//! (`Idle`, `Running`, `Paused`). Four work sessions make a cycle; the
//! fourth work session is followed by a long break.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::Completed) when a phase finishes
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::callbacks::{CallbackList, SubscriptionId};
use crate::events::Event;
use crate::settings::Settings;
use crate::stats::Session;

/// Work sessions per cycle; finishing the fourth starts a long break.
pub const SESSIONS_UNTIL_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_work(self) -> bool {
        self == SessionType::Work
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionType::Work => "Work",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Activity {
    Idle,
    Running,
    Paused,
}

/// Read-only snapshot of the engine. Always a fresh copy; mutating a
/// snapshot never touches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_running: bool,
    pub is_paused: bool,
    /// Seconds remaining in the current phase.
    pub current_time: u32,
    /// Full nominal duration of the current phase, in seconds.
    pub total_time: u32,
    pub session_type: SessionType,
    /// 1-based ordinal within the current 4-session cycle.
    pub session_count: u32,
    /// 0-based; bumped at the moment a long break begins.
    pub cycle_count: u32,
}

impl TimerState {
    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        1.0 - (self.current_time as f64 / self.total_time as f64)
    }
}

type SessionSink = Box<dyn FnMut(Session)>;

/// Core timer engine.
///
/// Serializes to JSON so a CLI process can persist the countdown between
/// invocations; subscriber lists and the session sink are runtime-only.
#[derive(Serialize, Deserialize)]
pub struct TimerEngine {
    settings: Settings,
    activity: Activity,
    session_type: SessionType,
    session_count: u32,
    cycle_count: u32,
    /// Seconds remaining in the current phase.
    current_time: u32,
    /// Nominal duration of the current phase in seconds.
    total_time: u32,
    /// Wall-clock instant the in-progress phase was started. Present
    /// only between `start()` from idle and the next completion/reset/
    /// skip; its presence is what makes a completion produce a Session.
    #[serde(default)]
    phase_started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    tick_subscribers: CallbackList<TimerState>,
    #[serde(skip)]
    complete_subscribers: CallbackList<SessionType>,
    #[serde(skip)]
    session_sink: Option<SessionSink>,
}

impl TimerEngine {
    /// Create an idle engine: Work phase, session 1, cycle 0, full time.
    pub fn new(settings: Settings) -> Self {
        let total_time = settings.duration_secs(SessionType::Work);
        Self {
            settings,
            activity: Activity::Idle,
            session_type: SessionType::Work,
            session_count: 1,
            cycle_count: 0,
            current_time: total_time,
            total_time,
            phase_started_at: None,
            tick_subscribers: CallbackList::default(),
            complete_subscribers: CallbackList::default(),
            session_sink: None,
        }
    }

    /// Wire the sink that receives completed-session records. Usually
    /// `StatsEngine::record_session` behind an `Rc<RefCell<..>>`.
    pub fn set_session_sink(&mut self, sink: impl FnMut(Session) + 'static) {
        self.session_sink = Some(Box::new(sink));
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Fresh deep copy of the externally visible state.
    pub fn state(&self) -> TimerState {
        TimerState {
            is_running: self.activity == Activity::Running,
            is_paused: self.activity == Activity::Paused,
            current_time: self.current_time,
            total_time: self.total_time,
            session_type: self.session_type,
            session_count: self.session_count,
            cycle_count: self.cycle_count,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Full state snapshot event, for CLI output.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin or resume the countdown. From idle the wall-clock start of
    /// the phase is recorded (it becomes the Session's start on natural
    /// completion); from paused the countdown resumes untouched. No-op
    /// while already running.
    pub fn start(&mut self) -> Option<Event> {
        match self.activity {
            Activity::Running => None,
            Activity::Paused => {
                self.activity = Activity::Running;
                Some(Event::Started {
                    session_type: self.session_type,
                    resumed: true,
                    remaining_secs: self.current_time,
                    at: Utc::now(),
                })
            }
            Activity::Idle => {
                self.activity = Activity::Running;
                self.phase_started_at = Some(Utc::now());
                Some(Event::Started {
                    session_type: self.session_type,
                    resumed: false,
                    remaining_secs: self.current_time,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Pause the countdown. No-op unless running.
    pub fn pause(&mut self) -> Option<Event> {
        if self.activity != Activity::Running {
            return None;
        }
        self.activity = Activity::Paused;
        Some(Event::Paused {
            session_type: self.session_type,
            remaining_secs: self.current_time,
            at: Utc::now(),
        })
    }

    /// Return the current phase to idle at its full nominal duration.
    /// The recorded start timestamp is discarded, so a reset phase never
    /// becomes a Session.
    pub fn reset(&mut self) -> Option<Event> {
        self.activity = Activity::Idle;
        self.phase_started_at = None;
        self.total_time = self.settings.duration_secs(self.session_type);
        self.current_time = self.total_time;
        Some(Event::Reset {
            session_type: self.session_type,
            at: Utc::now(),
        })
    }

    /// Abandon the current phase and transition immediately. Completion
    /// subscribers are notified (the UI treats a skip like a finish) but
    /// no Session is recorded.
    pub fn skip(&mut self) -> Option<Event> {
        let from = self.session_type;
        self.phase_started_at = None;
        self.finish_phase(from);
        Some(Event::Skipped {
            from,
            to: self.session_type,
            at: Utc::now(),
        })
    }

    /// Replace the timing parameters. While idle the current phase's
    /// countdown is recomputed immediately; while running or paused the
    /// in-progress countdown is left untouched and the new durations
    /// apply from the next phase transition.
    pub fn update_settings(&mut self, settings: Settings) -> Option<Event> {
        self.settings = settings;
        let applied = self.activity == Activity::Idle;
        if applied {
            self.total_time = self.settings.duration_secs(self.session_type);
            self.current_time = self.total_time;
        }
        Some(Event::SettingsUpdated {
            applied,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second of running activity. No-op
    /// unless running. Returns the completion event when the phase
    /// finishes.
    pub fn tick(&mut self) -> Option<Event> {
        if self.activity != Activity::Running {
            return None;
        }
        self.current_time = self.current_time.saturating_sub(1);
        let snapshot = self.state();
        self.tick_subscribers.notify(&snapshot);
        if self.current_time == 0 {
            return Some(self.complete_naturally());
        }
        None
    }

    /// Idempotent teardown: stop the countdown and drop every subscriber
    /// and the session sink. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        self.activity = Activity::Idle;
        self.phase_started_at = None;
        self.tick_subscribers.clear();
        self.complete_subscribers.clear();
        self.session_sink = None;
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Observe every tick with a fresh state snapshot.
    pub fn on_tick(&mut self, callback: impl FnMut(&TimerState) + 'static) -> SubscriptionId {
        self.tick_subscribers.subscribe(callback)
    }

    pub fn unsubscribe_tick(&mut self, id: SubscriptionId) -> bool {
        self.tick_subscribers.unsubscribe(id)
    }

    /// Observe phase completions (natural and skipped) with the phase
    /// that just finished.
    pub fn on_complete(&mut self, callback: impl FnMut(&SessionType) + 'static) -> SubscriptionId {
        self.complete_subscribers.subscribe(callback)
    }

    pub fn unsubscribe_complete(&mut self, id: SubscriptionId) -> bool {
        self.complete_subscribers.unsubscribe(id)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_naturally(&mut self) -> Event {
        let finished = self.session_type;
        self.emit_session(finished);
        self.finish_phase(finished);
        Event::Completed {
            session_type: finished,
            next: self.session_type,
            at: Utc::now(),
        }
    }

    /// Build the Session record for a naturally completed phase and hand
    /// it to the sink. Duration is actual elapsed wall-clock, not the
    /// nominal phase length. Sink failures stay out of the tick path.
    fn emit_session(&mut self, finished: SessionType) {
        let Some(started_at) = self.phase_started_at.take() else {
            return;
        };
        let ended_at = Utc::now();
        let elapsed_secs = ended_at
            .signed_duration_since(started_at)
            .num_seconds()
            .max(0);
        let session = Session {
            id: Uuid::new_v4(),
            session_type: finished,
            started_at,
            ended_at,
            completed: true,
            duration_min: ((elapsed_secs as f64) / 60.0).round() as u64,
        };
        if let Some(sink) = self.session_sink.as_mut() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink(session)));
            if result.is_err() {
                tracing::warn!("session sink panicked; completed session dropped");
            }
        }
    }

    /// Shared tail of natural completion and skip: notify completion
    /// subscribers, then run the phase-transition rule.
    fn finish_phase(&mut self, finished: SessionType) {
        self.activity = Activity::Idle;
        self.complete_subscribers.notify(&finished);
        self.advance_phase(finished);
    }

    fn advance_phase(&mut self, finished: SessionType) {
        self.session_type = match finished {
            SessionType::Work if self.session_count >= SESSIONS_UNTIL_LONG_BREAK => {
                self.session_count = 1;
                self.cycle_count += 1;
                SessionType::LongBreak
            }
            SessionType::Work => SessionType::ShortBreak,
            SessionType::ShortBreak => {
                self.session_count += 1;
                SessionType::Work
            }
            SessionType::LongBreak => SessionType::Work,
        };
        self.total_time = self.settings.duration_secs(self.session_type);
        self.current_time = self.total_time;
    }
}
