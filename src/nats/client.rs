use anyhow::{Context, Result};
use async_nats::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::messages::{
    CancelSpeechMessage, RecognizerAction, RecognizerControlMessage, SpeakMessage,
};
use crate::speech::SpeechRequest;

pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn publish_json<T: Serialize>(&self, subject: String, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        debug!("Published to {}", subject);

        Ok(())
    }

    /// Ask the STT service to start or stop recognizing for this session
    pub async fn publish_recognizer_control(
        &self,
        action: RecognizerAction,
        language: &str,
    ) -> Result<()> {
        let message = RecognizerControlMessage {
            session_id: self.session_id.clone(),
            action,
            language: language.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        self.publish_json(format!("stt.control.{}", self.session_id), &message)
            .await
    }

    /// Publish an utterance for the TTS service to speak
    pub async fn publish_speak(&self, request: &SpeechRequest, language: &str) -> Result<()> {
        let message = SpeakMessage {
            session_id: self.session_id.clone(),
            utterance_id: request.id,
            text: request.text.clone(),
            rate: request.rate,
            language: language.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        self.publish_json(format!("tts.speak.{}", self.session_id), &message)
            .await
    }

    pub async fn publish_cancel_speech(&self) -> Result<()> {
        let message = CancelSpeechMessage {
            session_id: self.session_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        self.publish_json(format!("tts.cancel.{}", self.session_id), &message)
            .await
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // The STT service publishes to stt.text.partial and stt.text.final;
        // messages are filtered by session_id in the payload
        let subject = "stt.text.>";

        info!("Subscribing to transcripts on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }

    /// Subscribe to playback start/end events for this session
    pub async fn subscribe_speech_events(&self) -> Result<async_nats::Subscriber> {
        let subject = format!("tts.event.{}", self.session_id);

        info!("Subscribing to speech events on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to speech events")?;

        Ok(subscriber)
    }
}
