use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::client::{CompletionClient, CompletionError};
use crate::workflows::admission::{AdmissionRepository, Principal, RepositoryError};

const UNKNOWN_STATUS: &str = "Pending";
const UNAVAILABLE_REPLY: &str =
    "Sorry, the AI service is currently unavailable. Please try again later.";
const UPSTREAM_FAILURE_REPLY: &str =
    "Sorry, I'm having trouble connecting to my brain. Please try again later.";
const EMPTY_COMPLETION_REPLY: &str = "Sorry, I could not understand that.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Completion,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantReply {
    pub reply: String,
    pub source: ReplySource,
}

impl AssistantReply {
    fn fallback(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            source: ReplySource::Fallback,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("A user message is required")]
    MissingQuestion,
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Answers applicant questions with their current status as context.
pub struct ChatAssistant<R, C> {
    repository: Arc<R>,
    client: Arc<C>,
}

impl<R, C> ChatAssistant<R, C>
where
    R: AdmissionRepository + 'static,
    C: CompletionClient + 'static,
{
    pub fn new(repository: Arc<R>, client: Arc<C>) -> Self {
        Self { repository, client }
    }

    pub async fn reply(
        &self,
        principal: &Principal,
        messages: &[ChatMessage],
    ) -> Result<AssistantReply, AssistantError> {
        let question = messages
            .iter()
            .rev()
            .find(|message| message.role == "user")
            .map(|message| message.content.trim())
            .filter(|content| !content.is_empty())
            .ok_or(AssistantError::MissingQuestion)?;

        let status = self
            .repository
            .application_for(&principal.email)?
            .map(|record| record.status.to_string());
        let prompt = build_prompt(status.as_deref().unwrap_or(UNKNOWN_STATUS), question);

        let reply = match self.client.complete(&prompt).await {
            Ok(Some(reply)) => AssistantReply {
                reply,
                source: ReplySource::Completion,
            },
            Ok(None) => AssistantReply::fallback(EMPTY_COMPLETION_REPLY),
            Err(CompletionError::NotConfigured) => {
                warn!("assistant completion key missing");
                AssistantReply::fallback(UNAVAILABLE_REPLY)
            }
            Err(err) => {
                warn!(error = %err, "assistant completion failed");
                AssistantReply::fallback(UPSTREAM_FAILURE_REPLY)
            }
        };
        Ok(reply)
    }
}

pub(crate) fn build_prompt(status: &str, question: &str) -> String {
    format!(
        "You are an AI assistant helping a student who applied for LIT School.\n\
         Their current application status is: {status}.\n\
         Be helpful, friendly, and concise. If you don't know something, say so.\n\n\
         Student question: {question}"
    )
}
