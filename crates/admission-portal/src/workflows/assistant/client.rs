use async_trait::async_trait;
use serde_json::{json, Value};

const MAX_COMPLETION_TOKENS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("completion API key is not configured")]
    NotConfigured,
    #[error("completion request failed: {0}")]
    Upstream(String),
}

/// Single-prompt text completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// `Ok(None)` when the upstream answered without any content.
    async fn complete(&self, prompt: &str) -> Result<Option<String>, CompletionError>;
}

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletionClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

pub(crate) fn request_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "max_tokens": MAX_COMPLETION_TOKENS,
    })
}

pub(crate) fn first_choice(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<Option<String>, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::NotConfigured)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body(&self.model, prompt))
            .send()
            .await
            .map_err(|err| CompletionError::Upstream(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Upstream(format!(
                "completion endpoint answered {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| CompletionError::Upstream(err.to_string()))?;
        Ok(first_choice(&body))
    }
}
