use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use nyay_core::agent::{CompletionBackend, CompletionRequest, ResponseFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Google Gemini over the public `generateContent` REST endpoint.
///
/// Models are tried in the configured order. The first model that returns
/// usable output wins; if every model fails, the per-model errors are
/// combined into one.
pub struct GeminiBackend {
    pub api_key: String,
    pub base_url: String,
    pub models: Vec<String>,
    pub timeout_secs: u64,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: nyay_core::config::DEFAULT_GEMINI_BASE_URL.to_string(),
            models,
            timeout_secs: 120,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate_with_model(&self, model: &str, request: &CompletionRequest) -> Result<String> {
        let body = build_request_body(request);

        let response = match self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => bail!("request timed out after {}s", self.timeout_secs),
            Err(e) => bail!("request failed: {e}"),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {status}: {}", body.trim());
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("unreadable generateContent response")?;
        let text = extract_text(&parsed)?;
        request.check_output(&text)?;
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: &'static str,
    pub response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: text.to_string(),
        }],
    }
}

/// Wire body for a single `generateContent` call.
pub fn build_request_body(request: &CompletionRequest) -> GenerateContentRequest {
    let system_instruction = (!request.system_instruction.is_empty())
        .then(|| text_content(None, &request.system_instruction));

    let generation_config = match &request.format {
        ResponseFormat::Text => None,
        ResponseFormat::Json { schema } => Some(GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema.clone(),
        }),
    };

    GenerateContentRequest {
        system_instruction,
        contents: vec![text_content(Some("user"), &request.prompt)],
        generation_config,
    }
}

/// Pull the answer text out of a response, treating a blocked prompt or a
/// candidate-less reply as a failure.
pub fn extract_text(response: &GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        bail!("response blocked by safety filters ({reason})");
    }
    let Some(candidate) = response.candidates.first() else {
        bail!("response blocked by safety filters or no candidates returned");
    };
    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        bail!("response blocked by safety filters (SAFETY)");
    }
    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .map(|p| p.text.as_str())
        .collect();
    Ok(text)
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        if self.models.is_empty() {
            bail!("no gemini models configured");
        }

        let mut errors = Vec::with_capacity(self.models.len());
        for model in &self.models {
            info!(model = %model, prompt_len = request.prompt.len(), "calling gemini");
            match self.generate_with_model(model, request).await {
                Ok(text) => {
                    info!(model = %model, output_len = text.len(), "gemini response received");
                    return Ok(text);
                },
                Err(e) => {
                    warn!(model = %model, "gemini attempt failed: {e:#}");
                    errors.push(format!("{model}: {e:#}"));
                },
            }
        }

        bail!("completion service unavailable: {}", errors.join(" | "))
    }
}
