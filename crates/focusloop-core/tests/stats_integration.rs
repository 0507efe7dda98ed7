//! Integration tests wiring the timer engine to the statistics engine
//! the way the CLI does: completed sessions flow through the session
//! sink into a store-backed StatsEngine.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use focusloop_core::{
    Session, SessionType, Settings, SqliteBackend, StatsEngine, Store, TimerEngine, UserStats,
    USER_STATS_KEY,
};

fn sqlite_store() -> Rc<Store> {
    Rc::new(Store::with_backend(Box::new(
        SqliteBackend::open_memory().unwrap(),
    )))
}

fn completed_session(session_type: SessionType, days_ago: i64, duration_min: u64) -> Session {
    let started_at = Utc::now() - Duration::days(days_ago);
    Session {
        id: Uuid::new_v4(),
        session_type,
        started_at,
        ended_at: started_at + Duration::minutes(duration_min as i64),
        completed: true,
        duration_min,
    }
}

#[test]
fn engine_completions_land_in_stats_through_the_sink() {
    let store = sqlite_store();
    let stats = Rc::new(RefCell::new(StatsEngine::new(Rc::clone(&store))));

    let mut engine = TimerEngine::new(Settings {
        work_minutes: 1,
        short_break_minutes: 1,
        ..Settings::default()
    });
    {
        let stats = Rc::clone(&stats);
        engine.set_session_sink(move |session| stats.borrow_mut().record_session(&session));
    }

    // One natural work completion, one skipped break.
    engine.start();
    for _ in 0..60 {
        engine.tick();
    }
    engine.skip();

    let stats = stats.borrow();
    assert_eq!(stats.get_total_sessions(), 1);
    let today = stats.get_today_stats();
    assert_eq!(today.completed_sessions, 1);
    assert_eq!(stats.get_current_streak(), 1);
}

#[test]
fn streak_spec_example_three_consecutive_days() {
    let store = sqlite_store();
    let mut stats = StatsEngine::new(Rc::clone(&store));
    stats.record_session(&completed_session(SessionType::Work, 2, 25));
    stats.record_session(&completed_session(SessionType::Work, 1, 25));
    stats.record_session(&completed_session(SessionType::Work, 0, 25));
    assert_eq!(stats.get_current_streak(), 3);
    assert_eq!(stats.get_stats().longest_streak, 3);

    // A later reset-and-single-stale-day history: current 0, longest kept.
    stats.reset_stats();
    stats.record_session(&completed_session(SessionType::Work, 5, 25));
    assert_eq!(stats.get_current_streak(), 0);
}

#[test]
fn aggregate_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusloop.db");

    {
        let store = Rc::new(Store::with_backend(Box::new(
            SqliteBackend::open_at(&path).unwrap(),
        )));
        let mut stats = StatsEngine::new(store);
        stats.record_session(&completed_session(SessionType::Work, 0, 25));
        stats.record_session(&completed_session(SessionType::ShortBreak, 0, 5));
    }

    // New store and engine over the same file: the aggregate is intact.
    let store = Rc::new(Store::with_backend(Box::new(
        SqliteBackend::open_at(&path).unwrap(),
    )));
    let stats = StatsEngine::new(store);
    assert_eq!(stats.get_total_sessions(), 2);
    let today = stats.get_today_stats();
    assert_eq!(today.work_minutes, 25);
    assert_eq!(today.break_minutes, 5);
}

#[test]
fn record_session_is_a_noop_for_incomplete_records() {
    let store = sqlite_store();
    let mut stats = StatsEngine::new(Rc::clone(&store));
    let mut session = completed_session(SessionType::Work, 0, 25);
    session.completed = false;
    stats.record_session(&session);

    assert_eq!(stats.get_total_sessions(), 0);
    let persisted = store.get(USER_STATS_KEY, UserStats::default());
    assert_eq!(persisted, UserStats::default());
}

#[test]
fn stats_changes_reach_subscribers_once_per_mutation() {
    let store = sqlite_store();
    let mut stats = StatsEngine::new(store);
    let notifications = Rc::new(RefCell::new(Vec::new()));
    {
        let notifications = Rc::clone(&notifications);
        stats.on_stats_change(move |s| notifications.borrow_mut().push(s.total_sessions));
    }

    stats.record_session(&completed_session(SessionType::Work, 0, 25));
    stats.record_session(&completed_session(SessionType::Work, 0, 25));
    stats.reset_stats();

    assert_eq!(*notifications.borrow(), vec![1, 2, 0]);
}
