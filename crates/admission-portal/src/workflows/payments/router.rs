use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::checkout::{CheckoutGateway, GatewayError};
use super::service::{PaymentService, PaymentServiceError};
use super::signature::SIGNATURE_HEADER;
use crate::workflows::admission::{AdmissionRepository, Principal};

/// Router builder exposing checkout creation and the processor webhook.
pub fn payment_router<R, G>(service: Arc<PaymentService<R, G>>) -> Router
where
    R: AdmissionRepository + 'static,
    G: CheckoutGateway + 'static,
{
    Router::new()
        .route("/api/v1/payments/checkout", post(checkout_handler::<R, G>))
        .route("/api/v1/payments/webhook", post(webhook_handler::<R, G>))
        .with_state(service)
}

pub(crate) async fn checkout_handler<R, G>(
    State(service): State<Arc<PaymentService<R, G>>>,
    principal: Principal,
) -> Response
where
    R: AdmissionRepository + 'static,
    G: CheckoutGateway + 'static,
{
    match service.create_checkout(&principal).await {
        Ok(started) => (StatusCode::OK, Json(started)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn webhook_handler<R, G>(
    State(service): State<Arc<PaymentService<R, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: AdmissionRepository + 'static,
    G: CheckoutGateway + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match service.confirm(&body, signature) {
        Ok(outcome) => {
            let payload = match serde_json::to_value(&outcome) {
                Ok(serde_json::Value::Object(mut fields)) => {
                    fields.insert("received".to_string(), json!(true));
                    serde_json::Value::Object(fields)
                }
                _ => json!({ "received": true }),
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

impl PaymentServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentServiceError::NotFound => StatusCode::NOT_FOUND,
            PaymentServiceError::Signature(_) | PaymentServiceError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            PaymentServiceError::NotAwaitingPayment(_) | PaymentServiceError::Conflict => {
                StatusCode::CONFLICT
            }
            PaymentServiceError::Gateway(GatewayError::NotConfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PaymentServiceError::Gateway(_) => StatusCode::BAD_GATEWAY,
            PaymentServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PaymentServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "payment request failed");
        }
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
