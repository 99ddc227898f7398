use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallStatus {
    #[default]
    Idle,
    Connecting,
    Listening,
    Thinking,
    CallEnded,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Idle => "Idle",
            CallStatus::Connecting => "Connecting",
            CallStatus::Listening => "Listening",
            CallStatus::Thinking => "Thinking",
            CallStatus::CallEnded => "Call Ended",
            CallStatus::Error => "Error",
        }
    }

    /// Connecting, Listening or Thinking
    pub fn is_in_call(&self) -> bool {
        matches!(
            self,
            CallStatus::Connecting | CallStatus::Listening | CallStatus::Thinking
        )
    }

    /// Terminal for the call instance that reached it
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::CallEnded | CallStatus::Error)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CallStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Committed user turn, sent to the dialogue service as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance(String);

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latest final transcript waiting for the silence window to elapse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub generation: u64,
    pub text: String,
}

/// The single live call
#[derive(Debug, Clone)]
pub struct CallSession {
    pub call_id: Uuid,

    /// True from call start until the service ends the call or it is stopped
    pub is_active: bool,

    /// Outcome summary, set only when the service ends the call
    pub outcome: Option<String>,

    pub started_at: DateTime<Utc>,

    /// Number of turns sent to the dialogue service
    pub turns: usize,

    pub pending: Option<PendingTurn>,

    /// A `/next` request has been issued and not yet answered
    pub turn_in_flight: bool,
}

impl CallSession {
    pub fn new() -> Self {
        Self {
            call_id: Uuid::new_v4(),
            is_active: true,
            outcome: None,
            started_at: Utc::now(),
            turns: 0,
            pending: None,
            turn_in_flight: false,
        }
    }
}

impl Default for CallSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the call published to observers
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallSnapshot {
    pub call_id: Option<Uuid>,
    pub status: CallStatus,
    pub is_active: bool,

    /// Whether the start-call affordance is enabled
    pub can_start: bool,

    pub speaking: bool,

    /// Most recent recognizer hypothesis ("You said")
    pub last_heard: Option<String>,

    pub outcome: Option<String>,
    pub last_error: Option<String>,
    pub turns: usize,
    pub started_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(CallStatus::Idle.to_string(), "Idle");
        assert_eq!(CallStatus::CallEnded.to_string(), "Call Ended");
        assert_eq!(
            serde_json::to_string(&CallStatus::CallEnded).unwrap(),
            "\"Call Ended\""
        );
    }

    #[test]
    fn test_in_call_statuses() {
        assert!(CallStatus::Connecting.is_in_call());
        assert!(CallStatus::Thinking.is_in_call());
        assert!(!CallStatus::Idle.is_in_call());
        assert!(!CallStatus::Error.is_in_call());
        assert!(CallStatus::Error.is_terminal());
        assert!(!CallStatus::Listening.is_terminal());
    }
}
