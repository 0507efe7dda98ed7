mod engine;

pub use engine::{SessionType, TimerEngine, TimerState, SESSIONS_UNTIL_LONG_BREAK};
