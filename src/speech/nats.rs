//! NATS-backed speech capabilities
//!
//! Recognition and synthesis run in external services; this side only
//! exchanges JSON messages with them:
//! - `stt.control.<session>`  start/stop recognition
//! - `stt.text.>`             transcripts (partial and final)
//! - `tts.speak.<session>`    utterances to speak
//! - `tts.cancel.<session>`   stop speaking
//! - `tts.event.<session>`    playback started/ended

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::capture::SpeechRecognizer;
use super::playback::{SpeechRequest, SpeechSynthesizer};
use crate::call::EventSink;
use crate::nats::{
    NatsClient, RecognizerAction, SpeechEventKind, SpeechEventMessage, TranscriptMessage,
};

pub struct NatsRecognizer {
    client: Arc<NatsClient>,
    language: String,
    task: Option<JoinHandle<()>>,
}

impl NatsRecognizer {
    pub fn new(client: Arc<NatsClient>, language: String) -> Self {
        Self {
            client,
            language,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for NatsRecognizer {
    async fn start(&mut self, events: EventSink) -> Result<()> {
        if self.is_listening() {
            return Ok(());
        }

        let mut transcript_sub = self
            .client
            .subscribe_transcripts()
            .await
            .context("Failed to subscribe to transcripts")?;

        self.client
            .publish_recognizer_control(RecognizerAction::Start, &self.language)
            .await
            .context("Failed to start recognition")?;

        let session_id = self.client.session_id().to_string();

        self.task = Some(tokio::spawn(async move {
            info!("Transcript receiving task started");

            while let Some(msg) = transcript_sub.next().await {
                match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) => {
                        if transcript.session_id != session_id {
                            continue;
                        }

                        if !events.segment(transcript.text, !transcript.partial) {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse transcript message: {}", e);
                    }
                }
            }

            warn!("Transcript subscription closed");
            events.capture_ended();
        }));

        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        self.client
            .publish_recognizer_control(RecognizerAction::Stop, &self.language)
            .await
    }

    fn is_listening(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "nats"
    }
}

pub struct NatsSynthesizer {
    client: Arc<NatsClient>,
    language: String,
    event_task: Option<JoinHandle<()>>,
}

impl NatsSynthesizer {
    pub fn new(client: Arc<NatsClient>, language: String) -> Self {
        Self {
            client,
            language,
            event_task: None,
        }
    }

    async fn ensure_event_listener(&mut self, events: EventSink) -> Result<()> {
        if self.event_task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }

        let mut sub = self.client.subscribe_speech_events().await?;

        self.event_task = Some(tokio::spawn(async move {
            while let Some(msg) = sub.next().await {
                let event = match serde_json::from_slice::<SpeechEventMessage>(&msg.payload) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Failed to parse speech event: {}", e);
                        continue;
                    }
                };

                let delivered = match event.event {
                    SpeechEventKind::Started => events.speech_started(event.utterance_id),
                    SpeechEventKind::Ended => events.speech_ended(event.utterance_id),
                };
                if !delivered {
                    return;
                }
            }
        }));

        Ok(())
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for NatsSynthesizer {
    async fn speak(&mut self, request: SpeechRequest, events: EventSink) -> Result<()> {
        self.ensure_event_listener(events).await?;
        self.client.publish_speak(&request, &self.language).await
    }

    async fn cancel(&mut self) -> Result<()> {
        self.client.publish_cancel_speech().await
    }

    fn name(&self) -> &str {
        "nats"
    }
}

impl Drop for NatsSynthesizer {
    fn drop(&mut self) {
        if let Some(task) = self.event_task.take() {
            task.abort();
        }
    }
}
