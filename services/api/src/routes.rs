use crate::infra::AppState;
use admission_portal::workflows::admission::{
    admission_router, AdmissionRepository, AdmissionService,
};
use admission_portal::workflows::assistant::{assistant_router, ChatAssistant, CompletionClient};
use admission_portal::workflows::payments::{payment_router, CheckoutGateway, PaymentService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_portal_routes<R, G, C>(
    admissions: Arc<AdmissionService<R>>,
    payments: Arc<PaymentService<R, G>>,
    assistant: Arc<ChatAssistant<R, C>>,
) -> Router
where
    R: AdmissionRepository + 'static,
    G: CheckoutGateway + 'static,
    C: CompletionClient + 'static,
{
    admission_router(admissions)
        .merge(payment_router(payments))
        .merge(assistant_router(assistant))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
