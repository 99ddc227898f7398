use serde::{Deserialize, Serialize};

/// Transcript message received from STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Start/stop request sent to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct RecognizerControlMessage {
    pub session_id: String,
    pub action: RecognizerAction,
    pub language: String,
    pub timestamp: String, // RFC3339 timestamp
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerAction {
    Start,
    Stop,
}

/// Utterance published to the TTS service
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakMessage {
    pub session_id: String,
    pub utterance_id: u64,
    pub text: String,
    pub rate: f32,
    pub language: String,
    pub timestamp: String,
}

/// Request to stop whatever the TTS service is speaking
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelSpeechMessage {
    pub session_id: String,
    pub timestamp: String,
}

/// Playback progress reported by the TTS service
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechEventMessage {
    pub session_id: String,
    pub utterance_id: u64,
    pub event: SpeechEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEventKind {
    Started,
    Ended,
}
