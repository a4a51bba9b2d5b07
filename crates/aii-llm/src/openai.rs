use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use aii_core::{ChatBackend, CompletionRequest, Error, Message, SettingsStore};

/// Model families that take `max_completion_tokens` instead of `max_tokens`.
/// Substring match against the model name; backend compatibility, not
/// caller-negotiable.
const NEWER_MODEL_MARKERS: &[&str] = &["gpt-4o", "gpt-5", "o1"];

fn is_newer_model(model: &str) -> bool {
    NEWER_MODEL_MARKERS.iter().any(|m| model.contains(m))
}

/// OpenAI-compatible chat completion backend.
///
/// Stateless: each call resolves the API key, base URL, and model from the
/// injected settings store, sends one request, and returns the reply text.
pub struct OpenAiBackend {
    http: Client,
    store: Arc<SettingsStore>,
}

impl OpenAiBackend {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self {
            http: Client::new(),
            store,
        }
    }

    fn build_request(&self, model: String, request: &CompletionRequest) -> OpenAiChatRequest {
        let (max_tokens, max_completion_tokens) = match request.max_tokens {
            Some(n) if is_newer_model(&model) => (None, Some(n)),
            Some(n) => (Some(n), None),
            None => (None, None),
        };

        OpenAiChatRequest {
            model,
            messages: request.messages.clone(),
            max_tokens,
            max_completion_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error> {
        let settings = self.store.snapshot();

        if settings.llm_api_key.is_empty() {
            return Err(Error::config(
                "LLM API key not configured. Use \"config llm-key <key>\" to set it.",
            ));
        }

        let model = request.model.clone().unwrap_or(settings.llm_model);
        let api_request = self.build_request(model, &request);
        debug!(model = %api_request.model, messages = api_request.messages.len(), "LLM request");

        let response = self
            .http
            .post(format!("{}/chat/completions", settings.llm_base_url))
            .header("Authorization", format!("Bearer {}", settings.llm_api_key))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "LLM request failed");
            return Err(Error::llm(status.as_u16(), body));
        }

        let api_response: OpenAiChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(Error::EmptyResponse)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, OpenAiBackend) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join("config.toml")).unwrap();
        (dir, OpenAiBackend::new(Arc::new(store)))
    }

    #[test]
    fn test_newer_model_markers() {
        assert!(is_newer_model("gpt-4o-mini"));
        assert!(is_newer_model("gpt-5.2"));
        assert!(is_newer_model("o1-preview"));
        assert!(!is_newer_model("gpt-4-turbo"));
        assert!(!is_newer_model("gpt-3.5-turbo"));
    }

    #[test]
    fn test_token_field_for_newer_model() {
        let (_dir, backend) = backend();
        let request = CompletionRequest::new(vec![Message::user("hi")]).with_max_tokens(256);
        let api = backend.build_request("gpt-5.2".to_string(), &request);
        assert_eq!(api.max_completion_tokens, Some(256));
        assert_eq!(api.max_tokens, None);
    }

    #[test]
    fn test_token_field_for_older_model() {
        let (_dir, backend) = backend();
        let request = CompletionRequest::new(vec![Message::user("hi")]).with_max_tokens(256);
        let api = backend.build_request("gpt-4-turbo".to_string(), &request);
        assert_eq!(api.max_tokens, Some(256));
        assert_eq!(api.max_completion_tokens, None);
    }

    #[test]
    fn test_no_token_limit_sends_neither() {
        let (_dir, backend) = backend();
        let request = CompletionRequest::new(vec![Message::user("hi")]);
        let api = backend.build_request("gpt-4".to_string(), &request);
        let json = serde_json::to_value(&api).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("max_completion_tokens").is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let (_dir, backend) = backend();
        let request = CompletionRequest::new(vec![Message::user("hi")]);
        let err = backend.complete(request).await.unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("API key not configured"));
    }
}
