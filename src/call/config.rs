use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the call orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    /// Silence window between the last final transcript and the turn commit
    /// Default: 600 ms
    pub debounce_ms: u64,

    /// Line spoken when the dialogue service ends the call
    pub closing_line: String,

    /// Speaking rate handed to the synthesizer (1.0 = normal)
    pub speech_rate: f32,

    /// Consecutive capture restarts allowed without a segment in between
    pub max_capture_restarts: u32,
}

impl CallConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 600,
            closing_line: "Thanks for your time.".to_string(),
            speech_rate: 0.9,
            max_capture_restarts: 3,
        }
    }
}
