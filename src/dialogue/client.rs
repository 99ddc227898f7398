use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{DialogueReply, StartReply, TurnRequest};
use crate::config::DialogueConfig;
use crate::error::CallError;

/// Remote dialogue service
///
/// Both calls are single round trips with no retry; failures go straight
/// back to the caller. The orchestrator issues at most one `send_turn` at a
/// time per call.
#[async_trait]
pub trait DialogueClient: Send + Sync {
    /// Begin a call and fetch the opening line
    async fn call_start(&self) -> Result<StartReply, CallError>;

    /// Send one committed user turn
    async fn send_turn(&self, text: &str) -> Result<DialogueReply, CallError>;
}

/// JSON-over-HTTP dialogue client
#[derive(Clone)]
pub struct HttpDialogueClient {
    client: Client,
    base_url: String,
}

impl HttpDialogueClient {
    pub fn new(config: &DialogueConfig) -> Result<Self, CallError> {
        let mut builder = Client::builder();
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        let client = builder.build().map_err(|e| {
            CallError::CapabilityUnavailable(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, CallError>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(CallError::Transport(format!("Server error {}: {}", status, error)));
        }

        response
            .json()
            .await
            .map_err(|e| CallError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl DialogueClient for HttpDialogueClient {
    async fn call_start(&self) -> Result<StartReply, CallError> {
        info!("Requesting call start from {}", self.base_url);
        self.post::<TurnRequest, _>("/start", None).await
    }

    async fn send_turn(&self, text: &str) -> Result<DialogueReply, CallError> {
        debug!("Sending turn: {:?}", text);
        let body = TurnRequest {
            text: text.to_string(),
        };
        self.post("/next", Some(&body)).await
    }
}
