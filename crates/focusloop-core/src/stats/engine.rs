//! Statistics engine: folds completed sessions into durable aggregates.

use std::rc::Rc;

use chrono::{Local, NaiveDate};

use super::{streak, DailyStats, Session, UserStats};
use crate::callbacks::{CallbackList, SubscriptionId};
use crate::error::StorageErrorKind;
use crate::storage::Store;
use crate::timer::SessionType;

/// Fixed kv key the aggregate lives under.
pub const USER_STATS_KEY: &str = "user_stats";

/// Daily buckets older than this many days are pruned.
pub const RETENTION_DAYS: i64 = 90;

/// Durable accounting, independent of the timer engine's lifetime: it
/// loads once at construction, mutates in place per completed session,
/// and persists after every mutation. Persistence failures are reported
/// and logged but never break the in-memory aggregate, so the current
/// process stays consistent even when durability is lost.
pub struct StatsEngine {
    store: Rc<Store>,
    stats: UserStats,
    subscribers: CallbackList<UserStats>,
}

impl StatsEngine {
    pub fn new(store: Rc<Store>) -> Self {
        let stats = store.get(USER_STATS_KEY, UserStats::default());
        Self {
            store,
            stats,
            subscribers: CallbackList::default(),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Fold a completed session into the aggregate. Sessions with
    /// `completed == false` are ignored entirely (the timer engine never
    /// sends them; this is defensive).
    pub fn record_session(&mut self, session: &Session) {
        if !session.completed {
            return;
        }
        self.record_session_on(session, Local::now().date_naive());
    }

    fn record_session_on(&mut self, session: &Session, today: NaiveDate) {
        let date = session.local_date();
        let idx = match self.stats.daily_stats.iter().position(|d| d.date == date) {
            Some(idx) => idx,
            None => {
                self.stats.daily_stats.push(DailyStats::new(date));
                self.stats.daily_stats.len() - 1
            }
        };
        let bucket = &mut self.stats.daily_stats[idx];
        bucket.completed_sessions += 1;
        if session.session_type == SessionType::Work {
            bucket.work_minutes += session.duration_min;
        } else {
            bucket.break_minutes += session.duration_min;
        }

        self.stats.total_sessions += 1;
        self.stats.current_streak = streak::current_streak(&self.stats.daily_stats, today);
        self.stats.longest_streak = self.stats.longest_streak.max(self.stats.current_streak);
        self.prune(today, RETENTION_DAYS);

        self.persist();
        self.notify();
    }

    /// Replace the aggregate with its zero value. Confirmation is the
    /// caller's concern.
    pub fn reset_stats(&mut self) {
        self.stats = UserStats::default();
        self.persist();
        self.notify();
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get_stats(&self) -> UserStats {
        self.stats.clone()
    }

    /// Today's bucket, or a zero bucket if nothing completed yet.
    pub fn get_today_stats(&self) -> DailyStats {
        let today = Local::now().date_naive();
        self.stats
            .daily_stats
            .iter()
            .find(|d| d.date == today)
            .cloned()
            .unwrap_or_else(|| DailyStats::new(today))
    }

    /// Buckets from the last `n` calendar days, ascending by date (for
    /// charting).
    pub fn get_recent_stats(&self, n: usize) -> Vec<DailyStats> {
        let today = Local::now().date_naive();
        let mut recent: Vec<DailyStats> = self
            .stats
            .daily_stats
            .iter()
            .filter(|d| {
                let gap = (today - d.date).num_days();
                gap >= 0 && gap < n as i64
            })
            .cloned()
            .collect();
        recent.sort_unstable_by_key(|d| d.date);
        recent
    }

    pub fn get_current_streak(&self) -> u32 {
        self.stats.current_streak
    }

    pub fn get_total_sessions(&self) -> u64 {
        self.stats.total_sessions
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Observe the aggregate after every mutation. Notification happens
    /// synchronously, in registration order, after the persisted write.
    pub fn on_stats_change(&mut self, callback: impl FnMut(&UserStats) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe_stats_change(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn prune(&mut self, today: NaiveDate, retention_days: i64) {
        self.stats
            .daily_stats
            .retain(|d| (today - d.date).num_days() < retention_days);
    }

    fn persist(&mut self) {
        match self.store.set_checked(USER_STATS_KEY, &self.stats) {
            Ok(()) => {}
            Err(e) if e.kind() == StorageErrorKind::QuotaExceeded => {
                // Shed the oldest half of the retained history, then
                // retry once.
                let today = Local::now().date_naive();
                self.prune(today, RETENTION_DAYS / 2);
                if self.store.set_checked(USER_STATS_KEY, &self.stats).is_err() {
                    tracing::warn!("stats persist retry failed; in-memory aggregate kept");
                }
            }
            Err(e) => {
                tracing::warn!("stats persist failed ({e}); in-memory aggregate kept");
            }
        }
    }

    fn notify(&mut self) {
        let snapshot = self.stats.clone();
        self.subscribers.notify(&snapshot);
    }
}
