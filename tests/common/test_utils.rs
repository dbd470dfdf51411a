use axum::Router;
use medscan_gateway::{
    classifier::ClassifierClient,
    config::{ClassifierConfig, Config, RelayConfig},
    llm::CompletionStreamer,
    server::{self, handlers::AppState},
};
use std::sync::Arc;

pub const TEST_BODY_LIMIT: usize = 1024 * 1024;

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.classifier.timeout_secs = 5;
    config.llm.api_key = Some("test-api-key".to_string());
    config.relay.first_fragment_timeout_secs = 5;
    config.relay.idle_timeout_secs = 5;
    config
}

pub fn classifier_at(base_url: &str) -> ClassifierClient {
    ClassifierClient::new(&ClassifierConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

/// Base URL nothing listens on.
pub fn unreachable_base_url() -> String {
    "http://127.0.0.1:9".to_string()
}

pub fn create_test_state(
    classifier_url: &str,
    llm: Arc<dyn CompletionStreamer>,
    relay: &RelayConfig,
) -> AppState {
    AppState::new(classifier_at(classifier_url), llm, relay)
}

pub fn create_test_app(classifier_url: &str, llm: Arc<dyn CompletionStreamer>) -> Router {
    let config = create_test_config();
    let state = create_test_state(classifier_url, llm, &config.relay);
    server::router(state, TEST_BODY_LIMIT)
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 3001
  logs:
    level: "debug"
  max_body_bytes: 5242880

classifier:
  base_url: "http://classifier.internal:5001/"
  timeout_secs: 10

llm:
  provider: "groq"
  base_url: "https://api.groq.com/openai/v1"
  api_key: "file-api-key"
  model: "meta-llama/llama-4-scout-17b-16e-instruct"
  temperature: 0.7
  max_tokens: 2048
  top_p: 1.0

relay:
  first_fragment_timeout_secs: 15
  idle_timeout_secs: 20
  channel_capacity: 8
  max_concurrent_streams: 4
"#;

/// Invalid configuration YAML for testing error cases
pub const INVALID_CONFIG_YAML: &str = r#"
server:
  port: "not-a-number"
"#;

pub const BOUNDARY: &str = "medscan-test-boundary";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Builds a multipart body holding a single file part.
pub fn multipart_file_body(field: &str, filename: &str, mime: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Formats `chat.completion.chunk` events the way an OpenAI-compatible server streams them.
pub fn sse_chunks(texts: &[&str]) -> String {
    let mut body = String::new();
    for (i, text) in texts.iter().enumerate() {
        let delta = if i == 0 {
            serde_json::json!({"role": "assistant", "content": text})
        } else {
            serde_json::json!({"content": text})
        };
        let chunk = serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": "meta-llama/llama-4-scout-17b-16e-instruct",
            "choices": [{"index": 0, "delta": delta, "finish_reason": null}]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
