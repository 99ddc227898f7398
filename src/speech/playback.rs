use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::call::EventSink;

/// One utterance handed to the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Identifies the utterance in start/end events
    pub id: u64,
    pub text: String,
    /// Speaking rate (1.0 = normal)
    pub rate: f32,
}

/// Text-to-speech capability
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Begin speaking `request`
    ///
    /// Reports `speech_started(request.id)` when audio begins and
    /// `speech_ended(request.id)` when it finishes.
    async fn speak(&mut self, request: SpeechRequest, events: EventSink) -> Result<()>;

    /// Stop whatever is being spoken
    async fn cancel(&mut self) -> Result<()>;

    /// Get synthesizer name for logging
    fn name(&self) -> &str;
}

/// Single-utterance playback on top of a `SpeechSynthesizer`
pub struct SpeechPlayback {
    synthesizer: Box<dyn SpeechSynthesizer>,
    events: EventSink,
    current: Option<u64>,
}

impl SpeechPlayback {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, events: EventSink) -> Self {
        Self {
            synthesizer,
            events,
            current: None,
        }
    }

    /// Cancel the current utterance, then speak `request`
    pub async fn speak(&mut self, request: SpeechRequest) {
        self.cancel_all().await;

        debug!("Speaking utterance {}: {:?}", request.id, request.text);
        let id = request.id;
        self.current = Some(id);

        if let Err(e) = self.synthesizer.speak(request, self.events.clone()).await {
            error!("Speech synthesis failed ({}): {}", self.synthesizer.name(), e);
            self.current = None;
            self.events.speech_ended(id);
        }
    }

    /// Stop any in-progress speech; never fails
    pub async fn cancel_all(&mut self) {
        let Some(id) = self.current.take() else {
            return;
        };

        debug!("Cancelling utterance {}", id);
        if let Err(e) = self.synthesizer.cancel().await {
            warn!("Failed to cancel speech ({}): {}", self.synthesizer.name(), e);
        }
    }

    pub fn current(&self) -> Option<u64> {
        self.current
    }
}
