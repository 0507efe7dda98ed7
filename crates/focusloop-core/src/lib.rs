//! # Focusloop Core Library
//!
//! Core business logic for the Focusloop work/break interval timer:
//! a CLI-first design where all operations are available through the
//! standalone `focusloop` binary, with any GUI being a thin layer over
//! this same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a caller-driven state machine advancing one
//!   second per `tick()`; it owns the authoritative countdown and the
//!   work/break phase-transition rules
//! - **Statistics Engine**: folds completed sessions into daily buckets,
//!   lifetime totals, and streak counters, persisting after every change
//! - **Settings**: bounded, silently-coerced timer configuration
//! - **Storage**: a typed key-value store over SQLite with a transparent
//!   in-memory fallback and classified error reporting
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`StatsEngine`]: session accounting and streaks
//! - [`SettingsStore`]: configuration management
//! - [`Store`]: durable key-value persistence

pub mod callbacks;
pub mod error;
pub mod events;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use callbacks::SubscriptionId;
pub use error::{CoreError, Result, SettingsError, StorageError, StorageErrorKind};
pub use events::Event;
pub use settings::{Settings, SettingsStore, SETTINGS_KEY};
pub use stats::{DailyStats, Session, StatsEngine, UserStats, RETENTION_DAYS, USER_STATS_KEY};
pub use storage::{
    data_dir, MemoryBackend, SqliteBackend, StorageBackend, StorageErrorEvent, Store, ENGINE_KEY,
};
pub use timer::{SessionType, TimerEngine, TimerState, SESSIONS_UNTIL_LONG_BREAK};
