use anyhow::Result;
use serde::Deserialize;

use crate::call::CallConfig;
use crate::speech::SpeechBackendKind;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub dialogue: DialogueConfig,
    pub speech: SpeechConfig,
    #[serde(default)]
    pub call: CallConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    /// Base URL of the dialogue service (`/start` and `/next` are appended)
    pub base_url: String,

    /// Per-request timeout; absent means the transport default (no timeout)
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub backend: SpeechBackendKind,
    pub nats_url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
