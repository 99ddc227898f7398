//! Speech capabilities
//!
//! Capture and playback are capability traits with two backends:
//! - NATS: external STT/TTS services exchanging JSON over NATS subjects
//! - Console: stdin lines in, printed replies out (headless runs, demos)

mod capture;
mod console;
mod nats;
mod playback;

pub use capture::{SpeechCapture, SpeechRecognizer, TranscriptSegment};
pub use console::{ConsoleSynthesizer, StdinRecognizer};
pub use nats::{NatsRecognizer, NatsSynthesizer};
pub use playback::{SpeechPlayback, SpeechRequest, SpeechSynthesizer};

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::config::SpeechConfig;
use crate::error::CallError;
use crate::nats::NatsClient;

/// Which speech backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackendKind {
    Nats,
    Console,
}

/// Recognizer and synthesizer pair for one orchestrator
pub struct SpeechBackend {
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
}

/// Speech backend factory
pub struct SpeechBackendFactory;

impl SpeechBackendFactory {
    /// Create the capability pair for `kind`
    ///
    /// Fails with `CapabilityUnavailable` when the backend cannot run here.
    pub async fn create(
        kind: SpeechBackendKind,
        config: &SpeechConfig,
        session_id: &str,
    ) -> Result<SpeechBackend, CallError> {
        info!("Creating {:?} speech backend", kind);

        match kind {
            SpeechBackendKind::Nats => {
                let client = NatsClient::connect(&config.nats_url, session_id.to_string())
                    .await
                    .map_err(|e| CallError::CapabilityUnavailable(format!("{:#}", e)))?;
                let client = Arc::new(client);

                Ok(SpeechBackend {
                    recognizer: Box::new(NatsRecognizer::new(
                        Arc::clone(&client),
                        config.language.clone(),
                    )),
                    synthesizer: Box::new(NatsSynthesizer::new(client, config.language.clone())),
                })
            }

            SpeechBackendKind::Console => Ok(SpeechBackend {
                recognizer: Box::new(StdinRecognizer::new()),
                synthesizer: Box::new(ConsoleSynthesizer::new()),
            }),
        }
    }
}
