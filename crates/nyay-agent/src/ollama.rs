use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use nyay_core::agent::{CompletionBackend, CompletionRequest, ResponseFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Calls a locally-hosted Ollama model via its native chat API.
///
/// Useful when case facts must not leave the machine. Structured verdicts
/// use Ollama's `format` field with the same schema Gemini receives.
pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout_secs: 120,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct OllamaMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Chat body for one request: optional system turn, then the prompt.
pub fn build_chat_request(model: &str, request: &CompletionRequest) -> OllamaChatRequest {
    let mut messages = Vec::new();
    if !request.system_instruction.is_empty() {
        messages.push(OllamaMessage {
            role: "system",
            content: request.system_instruction.clone(),
        });
    }
    messages.push(OllamaMessage {
        role: "user",
        content: request.prompt.clone(),
    });

    let format = match &request.format {
        ResponseFormat::Text => None,
        ResponseFormat::Json { schema } => Some(schema.clone()),
    };

    OllamaChatRequest {
        model: model.to_string(),
        messages,
        stream: false,
        format,
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        let body = build_chat_request(&self.model, request);

        info!(
            model = %self.model,
            base_url = %self.base_url,
            prompt_len = request.prompt.len(),
            "calling ollama chat API"
        );

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        let response = match self
            .client
            .post(&url)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(timeout_secs = self.timeout_secs, "ollama request timed out");
                bail!("ollama request timed out after {}s", self.timeout_secs);
            },
            Err(e) => {
                warn!("ollama request failed: {}", e);
                bail!("ollama request failed: {e}");
            },
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "ollama returned non-200: {}", body);
            bail!("ollama error {status}: {body}");
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .context("failed to parse ollama response")?;
        let output = parsed.message.content;

        request.check_output(&output)?;

        info!(model = %self.model, output_len = output.len(), "ollama response received");
        Ok(output)
    }
}
