//! Statistics: durable accounting of completed sessions.
//!
//! The timer engine hands each naturally completed phase to
//! [`StatsEngine::record_session`] as a [`Session`] record; the engine
//! folds it into per-day buckets, lifetime totals, and streak counters,
//! and persists the aggregate after every mutation. Day bucketing uses
//! the **local** calendar date of the session's start, matching the
//! behavior users expect from a timer on their own machine.

mod engine;
mod streak;

pub use engine::{StatsEngine, RETENTION_DAYS, USER_STATS_KEY};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::SessionType;

/// A completed interval, as emitted by the timer engine. Ephemeral:
/// consumed once by the statistics engine and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub session_type: SessionType,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub completed: bool,
    /// Actual elapsed wall-clock minutes, not the nominal phase length.
    pub duration_min: u64,
}

impl Session {
    /// The local calendar day this session is accounted under.
    pub fn local_date(&self) -> NaiveDate {
        self.started_at.with_timezone(&Local).date_naive()
    }
}

/// One calendar day's accumulated totals. Created lazily on the first
/// completed session of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub completed_sessions: u32,
    pub work_minutes: u64,
    pub break_minutes: u64,
}

impl DailyStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            completed_sessions: 0,
            work_minutes: 0,
            break_minutes: 0,
        }
    }
}

/// Lifetime aggregate, persisted as JSON under a fixed key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserStats {
    /// Lifetime completed-session counter; only ever increases (until an
    /// explicit reset).
    #[serde(default)]
    pub total_sessions: u64,
    /// Consecutive calendar days with at least one completed session,
    /// anchored at today or yesterday.
    #[serde(default)]
    pub current_streak: u32,
    /// High-water mark of `current_streak`.
    #[serde(default)]
    pub longest_streak: u32,
    /// Per-day buckets, pruned to the retention window. Order is not
    /// meaningful.
    #[serde(default)]
    pub daily_stats: Vec<DailyStats>,
}
