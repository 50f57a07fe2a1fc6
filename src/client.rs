use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;

use crate::form::{FormState, GeneratedImage, Settlement};

pub const GENERATE_PATH: &str = "/api/generate";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode image: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image download failed with status {0}")]
    Download(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The round trip ran and the form state was settled.
    Settled,
    /// Submitting was disabled (blank prompt or a request already in flight).
    Ignored,
}

/// A prompt form bound to a proxy server. Clones share the same state, so at
/// most one request is in flight per form no matter how many handles submit.
#[derive(Clone)]
pub struct GenerateForm {
    http_client: reqwest::Client,
    endpoint: String,
    state: Arc<Mutex<FormState>>,
}

impl GenerateForm {
    pub fn new(http_client: reqwest::Client, server_url: &str) -> Self {
        Self {
            http_client,
            endpoint: format!("{}{}", server_url.trim_end_matches('/'), GENERATE_PATH),
            state: Arc::new(Mutex::new(FormState::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        // state stays consistent even if a holder panicked mid-update
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.lock().set_prompt(prompt);
    }

    pub fn snapshot(&self) -> FormState {
        self.lock().clone()
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let Some(prompt) = self.lock().begin_submit() else {
            return SubmitOutcome::Ignored;
        };

        let settlement = self.round_trip(&prompt).await;
        self.lock().settle(settlement);
        SubmitOutcome::Settled
    }

    async fn round_trip(&self, prompt: &str) -> Settlement {
        let response = match self
            .http_client
            .post(&self.endpoint)
            .json(&GenerateBody { prompt })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!("Request to {} failed: {}", self.endpoint, e);
                return Settlement::Failed(e.to_string());
            }
        };

        let status = response.status();
        let data: serde_json::Value = match response.json().await {
            Ok(data) => data,
            // error bodies are not always JSON
            Err(_) if !status.is_success() => return Settlement::Rejected(None),
            Err(e) => return Settlement::Failed(format!("Failed to read response: {}", e)),
        };

        if !status.is_success() {
            let message = data
                .get("error")
                .and_then(serde_json::Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            return Settlement::Rejected(message);
        }

        Settlement::Success(data)
    }

    /// Fetch the bytes behind a generated image: decoded inline for base64,
    /// downloaded for URLs.
    pub async fn image_bytes(&self, image: &GeneratedImage) -> Result<Vec<u8>, ClientError> {
        match image {
            GeneratedImage::Base64(data) => {
                use base64::Engine as _;
                Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
            }
            GeneratedImage::Url(url) => {
                let resp = self.http_client.get(url).send().await?;
                if !resp.status().is_success() {
                    return Err(ClientError::Download(resp.status().as_u16()));
                }
                Ok(resp.bytes().await?.to_vec())
            }
        }
    }
}
