use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::client::CompletionClient;
use super::service::{AssistantError, ChatAssistant, ChatRequest};
use crate::workflows::admission::{AdmissionRepository, Principal};

pub fn assistant_router<R, C>(assistant: Arc<ChatAssistant<R, C>>) -> Router
where
    R: AdmissionRepository + 'static,
    C: CompletionClient + 'static,
{
    Router::new()
        .route("/api/v1/assistant/chat", post(chat_handler::<R, C>))
        .with_state(assistant)
}

pub(crate) async fn chat_handler<R, C>(
    State(assistant): State<Arc<ChatAssistant<R, C>>>,
    principal: Principal,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
    C: CompletionClient + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return AssistantError::InvalidRequest(rejection.body_text()).into_response()
        }
    };
    match assistant.reply(&principal, &request.messages).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let status = match self {
            AssistantError::MissingQuestion | AssistantError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AssistantError::Repository(_) => {
                error!(error = %self, "assistant lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
