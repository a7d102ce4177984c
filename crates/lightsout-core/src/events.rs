use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Mode, SessionPhase};

/// Every state change in the system produces an Event.
/// The presentation layer renders them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        mode: Mode,
        total_seconds: u64,
        unlock_after_secs: u64,
        at: DateTime<Utc>,
    },
    SessionTicked {
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    /// The 20% rule has been satisfied; exit is now allowed.
    SessionUnlocked {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// An exit was requested while the session was still locked.
    ExitRefused {
        remaining_to_unlock_secs: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        mode: Mode,
        total_seconds: u64,
        at: DateTime<Utc>,
    },
    SessionExited {
        mode: Mode,
        elapsed_secs: u64,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: SessionPhase,
        mode: Mode,
        total_seconds: u64,
        seconds_remaining: u64,
        remaining: String,
        unlock_wait: String,
        at: DateTime<Utc>,
    },
    PresetAdded {
        id: String,
        title: String,
        at: DateTime<Utc>,
    },
    PresetRemoved {
        id: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::SessionTicked {
            seconds_remaining: 42,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionTicked");
        assert_eq!(json["seconds_remaining"], 42);
    }
}
