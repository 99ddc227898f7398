pub mod client;
pub mod messages;

pub use client::NatsClient;
pub use messages::{
    CancelSpeechMessage, RecognizerAction, RecognizerControlMessage, SpeakMessage,
    SpeechEventKind, SpeechEventMessage, TranscriptMessage,
};
