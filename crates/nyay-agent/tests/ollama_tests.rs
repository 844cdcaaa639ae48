use nyay_agent::ollama::build_chat_request;
use nyay_agent::OllamaBackend;
use nyay_core::agent::{CompletionBackend, CompletionRequest};
use serde_json::json;

#[test]
fn test_chat_request_puts_system_turn_first() {
    let req = CompletionRequest::text("Rebut.", "You are Defense Counsel.");
    let body = serde_json::to_value(build_chat_request("llama3.1", &req)).unwrap();

    assert_eq!(
        body,
        json!({
            "model": "llama3.1",
            "messages": [
                { "role": "system", "content": "You are Defense Counsel." },
                { "role": "user", "content": "Rebut." }
            ],
            "stream": false
        })
    );
}

#[test]
fn test_json_request_passes_schema_as_format() {
    let schema = json!({ "type": "object", "required": ["ruling"] });
    let req = CompletionRequest::json("Decide.", "", schema.clone());
    let body = serde_json::to_value(build_chat_request("llama3.1", &req)).unwrap();

    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["format"], schema);
}

#[tokio::test]
async fn test_one_backend_serves_repeated_calls() {
    let backend = OllamaBackend::new("http://127.0.0.1:1", "llama3.1").with_timeout(2);

    for _ in 0..2 {
        let err = backend
            .generate(&CompletionRequest::text("hello", ""))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("ollama request"), "{err}");
    }
}
