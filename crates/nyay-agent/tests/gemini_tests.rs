// Tests for the Gemini wire helpers and the model fallback chain.

use nyay_agent::gemini::{build_request_body, extract_text, GenerateContentResponse};
use nyay_agent::GeminiBackend;
use nyay_core::agent::{CompletionBackend, CompletionRequest};
use serde_json::json;
use tracing_test::traced_test;

fn response(value: serde_json::Value) -> GenerateContentResponse {
    serde_json::from_value(value).unwrap()
}

// =============================================================================
// Request body
// =============================================================================

#[test]
fn test_text_request_body_shape() {
    let req = CompletionRequest::text("Argue the case.", "You are Plaintiff Counsel.");
    let body = serde_json::to_value(build_request_body(&req)).unwrap();

    assert_eq!(
        body,
        json!({
            "systemInstruction": { "parts": [{ "text": "You are Plaintiff Counsel." }] },
            "contents": [{ "role": "user", "parts": [{ "text": "Argue the case." }] }]
        })
    );
}

#[test]
fn test_json_request_sets_mime_type_and_schema() {
    let schema = json!({ "type": "object", "required": ["ruling"] });
    let req = CompletionRequest::json("Decide.", "", schema.clone());
    let body = serde_json::to_value(build_request_body(&req)).unwrap();

    assert!(body.get("systemInstruction").is_none());
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["responseSchema"], schema);
}

// =============================================================================
// Response handling
// =============================================================================

#[test]
fn test_extract_text_joins_parts_of_first_candidate() {
    let resp = response(json!({
        "candidates": [
            {
                "content": { "role": "model", "parts": [{ "text": "My Lord, " }, { "text": "Article 21." }] },
                "finishReason": "STOP"
            },
            { "content": { "parts": [{ "text": "ignored" }] } }
        ]
    }));
    assert_eq!(extract_text(&resp).unwrap(), "My Lord, Article 21.");
}

#[test]
fn test_no_candidates_is_a_failure() {
    let err = extract_text(&response(json!({}))).unwrap_err();
    assert!(err.to_string().contains("no candidates"), "{err}");
}

#[test]
fn test_prompt_block_reason_is_a_failure() {
    let resp = response(json!({
        "candidates": [],
        "promptFeedback": { "blockReason": "SAFETY" }
    }));
    let err = extract_text(&resp).unwrap_err();
    assert!(err.to_string().contains("safety"), "{err}");
}

#[test]
fn test_safety_finish_is_a_failure() {
    let resp = response(json!({
        "candidates": [{ "finishReason": "SAFETY" }]
    }));
    assert!(extract_text(&resp).is_err());
}

// =============================================================================
// Fallback chain
// =============================================================================

#[tokio::test]
#[traced_test]
async fn test_every_model_is_tried_and_reported() {
    let backend = GeminiBackend::new(
        "test-key",
        vec!["model-a".to_string(), "model-b".to_string()],
    )
    .with_base_url("http://127.0.0.1:1")
    .with_timeout(2);

    let err = backend
        .generate(&CompletionRequest::text("hello", ""))
        .await
        .unwrap_err()
        .to_string();

    assert!(err.starts_with("completion service unavailable"), "{err}");
    assert!(err.contains("model-a: "), "{err}");
    assert!(err.contains(" | model-b: "), "{err}");
    assert!(logs_contain("gemini attempt failed"));
}

#[tokio::test]
async fn test_empty_model_list_fails_fast() {
    let backend = GeminiBackend::new("k", Vec::new());
    assert!(backend
        .generate(&CompletionRequest::text("hello", ""))
        .await
        .is_err());
}
