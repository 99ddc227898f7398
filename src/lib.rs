pub mod call;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod http;
pub mod nats;
pub mod speech;

pub use call::{
    CallConfig, CallEvent, CallHandle, CallMachine, CallOrchestrator, CallSnapshot, CallStatus,
    EventSink, TurnDebouncer,
};
pub use config::Config;
pub use dialogue::{DialogueClient, DialogueReply, HttpDialogueClient, StartReply};
pub use error::CallError;
pub use http::{create_router, AppState};
pub use nats::NatsClient;
pub use speech::{
    SpeechBackend, SpeechBackendFactory, SpeechBackendKind, SpeechCapture, SpeechPlayback,
    SpeechRecognizer, SpeechRequest, SpeechSynthesizer, TranscriptSegment,
};
