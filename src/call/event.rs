use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::dialogue::{DialogueReply, StartReply};
use crate::error::CallError;
use crate::speech::TranscriptSegment;

/// Everything the orchestrator reacts to
///
/// Capabilities, timers and network tasks never touch call state directly;
/// they post one of these into the orchestrator's inbox instead.
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// User pressed "start call"
    StartRequested,

    /// Explicit teardown of the current call
    StopRequested,

    /// Result of the opening `/start` round trip
    CallStarted {
        call_id: Uuid,
        result: Result<StartReply, CallError>,
    },

    /// Speech capture could not be started for this call
    CaptureFailed { call_id: Uuid, error: CallError },

    /// Recognizer produced a hypothesis (interim or final)
    Segment(TranscriptSegment),

    /// Silence window elapsed for the pending turn
    DebounceFired {
        call_id: Uuid,
        generation: u64,
        text: String,
    },

    /// Result of a `/next` round trip
    TurnReplied {
        call_id: Uuid,
        result: Result<DialogueReply, CallError>,
    },

    SpeechStarted { utterance: u64 },
    SpeechEnded { utterance: u64 },

    /// Recognizer stopped, voluntarily or not
    CaptureEnded,

    /// Stop the orchestrator task
    Shutdown,
}

/// Cloneable sender into the orchestrator inbox
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<CallEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CallEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post an event; returns false once the orchestrator has gone away
    pub fn send(&self, event: CallEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                debug!("Orchestrator inbox closed, dropping {:?}", e.0);
                false
            }
        }
    }

    pub fn segment(&self, text: impl Into<String>, is_final: bool) -> bool {
        self.send(CallEvent::Segment(TranscriptSegment::new(text, is_final)))
    }

    pub fn capture_ended(&self) -> bool {
        self.send(CallEvent::CaptureEnded)
    }

    pub fn speech_started(&self, utterance: u64) -> bool {
        self.send(CallEvent::SpeechStarted { utterance })
    }

    pub fn speech_ended(&self, utterance: u64) -> bool {
        self.send(CallEvent::SpeechEnded { utterance })
    }
}
