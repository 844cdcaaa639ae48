use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Shape a backend must hand back for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Free prose, shown to the user as-is.
    Text,
    /// A single JSON object conforming to `schema` (OpenAPI-subset, as
    /// accepted by Gemini's `responseSchema`).
    Json { schema: Value },
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Persona instruction sent as the system turn. May be empty.
    pub system_instruction: String,
    pub format: ResponseFormat,
}

impl CompletionRequest {
    pub fn text(prompt: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: system_instruction.into(),
            format: ResponseFormat::Text,
        }
    }

    pub fn json(
        prompt: impl Into<String>,
        system_instruction: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: system_instruction.into(),
            format: ResponseFormat::Json { schema },
        }
    }

    /// Reject output that does not honour the requested format.
    ///
    /// Backends call this on every attempt so that a bad structured answer
    /// counts as a failed attempt and the next model gets a turn.
    pub fn check_output(&self, output: &str) -> Result<()> {
        if output.trim().is_empty() {
            bail!("empty completion");
        }
        match &self.format {
            ResponseFormat::Text => Ok(()),
            ResponseFormat::Json { schema } => {
                let value: Value = serde_json::from_str(output.trim())
                    .map_err(|e| anyhow::anyhow!("completion is not valid JSON: {e}"))?;
                check_required(&value, schema)
            }
        }
    }
}

/// Verify `value` is an object carrying every property the schema marks as
/// required. Types are left to the caller's strict deserialization.
pub fn check_required(value: &Value, schema: &Value) -> Result<()> {
    let Some(obj) = value.as_object() else {
        bail!("expected a JSON object, got {}", json_kind(value));
    };
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let missing: Vec<&str> = required
        .iter()
        .filter_map(Value::as_str)
        .filter(|key| obj.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        bail!("missing required field(s): {}", missing.join(", "));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A prompt-in, text-out completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short identifier used in logs and the health check.
    fn name(&self) -> &str;

    async fn generate(&self, request: &CompletionRequest) -> Result<String>;
}
