use serde::{Deserialize, Serialize};

/// Response to `POST /start`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartReply {
    /// Opening line to speak
    pub reply: String,
}

/// Body of `POST /next`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

/// Response to `POST /next`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueReply {
    /// Omitted by the service when it ends the call
    #[serde(default)]
    pub reply: String,

    /// The service considers the call over
    #[serde(default)]
    pub end: bool,

    /// Human-readable outcome summary, present when `end` is true
    #[serde(rename = "final", default, skip_serializing_if = "Option::is_none")]
    pub final_outcome: Option<String>,
}

impl DialogueReply {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            end: false,
            final_outcome: None,
        }
    }

    pub fn end(text: impl Into<String>, outcome: Option<&str>) -> Self {
        Self {
            reply: text.into(),
            end: true,
            final_outcome: outcome.map(str::to_string),
        }
    }
}
