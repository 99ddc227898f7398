//! Call error taxonomy
//!
//! Every failure is local to the call that produced it. The user-facing
//! surface only ever sees the generic `Error` status plus the short
//! rendering of one of these variants.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallError {
    /// Speech capture or synthesis cannot run in this environment
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Capture error: {0}")]
    Capture(String),
}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CallError::Timeout
        } else if err.is_decode() {
            CallError::InvalidResponse(err.to_string())
        } else {
            CallError::Transport(err.to_string())
        }
    }
}
