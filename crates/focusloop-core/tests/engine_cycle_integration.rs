//! Integration tests for the timer engine's cycle bookkeeping.
//!
//! These walk whole work/break cycles through the public surface the
//! way a driving UI would: start, tick to zero, observe the transition.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use focusloop_core::{Event, Session, SessionType, Settings, TimerEngine};

fn short_settings() -> Settings {
    Settings {
        work_minutes: 1,
        short_break_minutes: 1,
        long_break_minutes: 2,
        ..Settings::default()
    }
}

/// Start the current phase and tick it to natural completion.
fn complete_phase(engine: &mut TimerEngine) -> Vec<Event> {
    let mut events = Vec::new();
    if let Some(event) = engine.start() {
        events.push(event);
    }
    loop {
        match engine.tick() {
            Some(event @ Event::Completed { .. }) => {
                events.push(event);
                break;
            }
            Some(event) => events.push(event),
            None => {}
        }
        if !engine.state().is_running {
            break;
        }
    }
    events
}

#[test]
fn full_cycle_phase_sequence() {
    let mut engine = TimerEngine::new(short_settings());

    // (type, count, cycle) observed after each natural completion.
    let mut observed = Vec::new();
    for _ in 0..8 {
        complete_phase(&mut engine);
        let state = engine.state();
        observed.push((state.session_type, state.session_count, state.cycle_count));
    }

    assert_eq!(
        observed,
        vec![
            (SessionType::ShortBreak, 1, 0), // after work #1
            (SessionType::Work, 2, 0),
            (SessionType::ShortBreak, 2, 0), // after work #2
            (SessionType::Work, 3, 0),
            (SessionType::ShortBreak, 3, 0), // after work #3
            (SessionType::Work, 4, 0),
            (SessionType::LongBreak, 1, 1), // after work #4
            (SessionType::Work, 1, 1),      // after the long break
        ]
    );
}

#[test]
fn countdown_reaches_exactly_zero_with_one_completion() {
    let mut engine = TimerEngine::new(short_settings());
    engine.start();
    let total = engine.state().total_time;

    let mut completions = 0;
    for i in 1..=total {
        match engine.tick() {
            Some(Event::Completed { .. }) => {
                completions += 1;
                assert_eq!(i, total, "completion fired before the countdown ended");
            }
            _ => assert_eq!(engine.state().current_time, total - i),
        }
    }
    assert_eq!(completions, 1);
}

#[test]
fn pause_holds_time_and_resume_finishes_the_remainder() {
    let mut engine = TimerEngine::new(short_settings());
    engine.start();
    for _ in 0..20 {
        engine.tick();
    }
    engine.pause();

    // Simulated time passing while paused changes nothing.
    for _ in 0..100 {
        assert!(engine.tick().is_none());
    }
    assert_eq!(engine.state().current_time, 40);

    engine.start();
    let mut completed = false;
    for _ in 0..40 {
        if let Some(Event::Completed { .. }) = engine.tick() {
            completed = true;
        }
    }
    assert!(completed);
}

#[test]
fn skip_never_records_a_session_natural_completion_always_does() {
    let mut engine = TimerEngine::new(short_settings());
    let sessions: Rc<RefCell<Vec<Session>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let sessions = Rc::clone(&sessions);
        engine.set_session_sink(move |s| sessions.borrow_mut().push(s));
    }

    engine.start();
    engine.skip();
    assert!(sessions.borrow().is_empty());

    complete_phase(&mut engine); // short break, natural
    assert_eq!(sessions.borrow().len(), 1);
    assert_eq!(sessions.borrow()[0].session_type, SessionType::ShortBreak);

    engine.skip(); // work, never started
    assert_eq!(sessions.borrow().len(), 1);
}

#[test]
fn settings_change_mid_countdown_lands_at_the_next_transition() {
    let mut engine = TimerEngine::new(short_settings());
    engine.start();
    engine.tick();

    let mut updated = short_settings();
    updated.work_minutes = 3;
    updated.short_break_minutes = 4;
    engine.update_settings(updated);

    // Untouched mid-countdown.
    assert_eq!(engine.state().total_time, 60);

    for _ in 0..59 {
        engine.tick();
    }
    // The next phase uses the new short-break duration.
    assert_eq!(engine.state().session_type, SessionType::ShortBreak);
    assert_eq!(engine.state().total_time, 4 * 60);

    // And a reset of the following work phase picks up 3 minutes.
    engine.skip();
    engine.reset();
    assert_eq!(engine.state().session_type, SessionType::Work);
    assert_eq!(engine.state().total_time, 3 * 60);
}

proptest! {
    /// For any number of phase completions, the cycle bookkeeping stays
    /// coherent: session_count in 1..=4, a long break exactly when the
    /// fourth work phase ends, cycle_count equal to the long breaks
    /// begun.
    #[test]
    fn cycle_bookkeeping_invariants(completions in 0usize..64) {
        let mut engine = TimerEngine::new(short_settings());
        let mut long_breaks_begun = 0u32;

        for _ in 0..completions {
            let before = engine.state();
            engine.skip();
            let after = engine.state();

            prop_assert!((1..=4).contains(&after.session_count));
            if after.session_type == SessionType::LongBreak {
                long_breaks_begun += 1;
                prop_assert_eq!(before.session_type, SessionType::Work);
                prop_assert_eq!(before.session_count, 4);
                prop_assert_eq!(after.session_count, 1);
            }
            prop_assert_eq!(after.cycle_count, long_breaks_begun);
        }
    }
}
