use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerState};

/// Every externally observable timer transition produces an Event.
/// Engine operations return them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Started {
        session_type: SessionType,
        /// True when the start resumed a paused countdown.
        resumed: bool,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    Paused {
        session_type: SessionType,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    Reset {
        session_type: SessionType,
        at: DateTime<Utc>,
    },
    Skipped {
        from: SessionType,
        to: SessionType,
        at: DateTime<Utc>,
    },
    Completed {
        session_type: SessionType,
        next: SessionType,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        /// False when the machine was mid-countdown and the new durations
        /// only take effect at the next phase transition.
        applied: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        #[serde(flatten)]
        state: TimerState,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::Completed {
            session_type: SessionType::Work,
            next: SessionType::ShortBreak,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "completed");
        assert_eq!(json["session_type"], "work");
        assert_eq!(json["next"], "short_break");
    }
}
