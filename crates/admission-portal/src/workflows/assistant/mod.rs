//! Advisory chat assistant for applicants. Read-only with respect to applications.

pub mod client;
pub mod router;
pub mod service;

pub use client::{CompletionClient, CompletionError, OpenAiCompletionClient};
pub use router::assistant_router;
pub use service::{
    AssistantError, AssistantReply, ChatAssistant, ChatMessage, ChatRequest, ReplySource,
};
