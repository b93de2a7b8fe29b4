use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::auth::Principal;
use super::domain::TaskSubmission;
use super::repository::AdmissionRepository;
use super::service::{
    AdmissionService, AdmissionServiceError, CredentialsRequest, DecisionRequest,
    InterviewRequest, ProfileForm, RegistrationForm, TransitionRequest,
};
use super::timeline::TimelineOrder;

/// Router builder exposing applicant and admin endpoints.
pub fn admission_router<R>(service: Arc<AdmissionService<R>>) -> Router
where
    R: AdmissionRepository + 'static,
{
    Router::new()
        .route("/api/v1/admission/register", post(register_handler::<R>))
        .route("/api/v1/auth/credentials", post(credentials_handler::<R>))
        .route("/api/v1/application/status", get(status_handler::<R>))
        .route("/api/v1/application/timeline", get(timeline_handler::<R>))
        .route(
            "/api/v1/application/schedule-interview",
            post(schedule_interview_handler::<R>),
        )
        .route(
            "/api/v1/application/submit-task",
            post(submit_task_handler::<R>),
        )
        .route(
            "/api/v1/application/task-details",
            get(task_details_handler::<R>),
        )
        .route(
            "/api/v1/user/profile",
            get(profile_handler::<R>).put(update_profile_handler::<R>),
        )
        .route(
            "/api/v1/admin/applications",
            get(list_applications_handler::<R>),
        )
        .route(
            "/api/v1/admin/applications/status",
            post(transition_handler::<R>),
        )
        .route(
            "/api/v1/admin/applications/decision",
            post(decision_handler::<R>),
        )
        .route(
            "/api/v1/admin/applications/timeline",
            post(annotate_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ViewQuery {
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) order: Option<TimelineOrder>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotationRequest {
    #[serde(default)]
    pub(crate) user_email: String,
    #[serde(default)]
    pub(crate) step: String,
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match json_body(payload).and_then(|form| service.register(form)) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn credentials_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match json_body(payload).and_then(|request| service.verify_credentials(request)) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    let result = query_params(query).and_then(|query| {
        let order = query.order.unwrap_or_default();
        service.status(&principal, query.email.as_deref(), order)
    });
    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn timeline_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    let result = query_params(query).and_then(|query| {
        let order = query.order.unwrap_or_default();
        service.timeline(&principal, query.email.as_deref(), order)
    });
    match result {
        Ok(steps) => (StatusCode::OK, Json(steps)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn schedule_interview_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    payload: Result<Json<InterviewRequest>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match json_body(payload).and_then(|request| service.schedule_interview(&principal, request)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn submit_task_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    payload: Result<Json<TaskSubmission>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match json_body(payload).and_then(|submission| service.submit_task(&principal, submission)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn task_details_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match service.task_details(&principal) {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn profile_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match service.profile(&principal) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_profile_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    payload: Result<Json<ProfileForm>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match json_body(payload).and_then(|form| service.update_profile(&principal, form)) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_applications_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    let result = query_params(query)
        .and_then(|query| service.list_applications(&principal, query.status.as_deref()));
    match result {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn transition_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match json_body(payload).and_then(|request| service.transition(&principal, request)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn decision_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match json_body(payload).and_then(|request| service.decide(&principal, request)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn annotate_handler<R>(
    State(service): State<Arc<AdmissionService<R>>>,
    principal: Principal,
    payload: Result<Json<AnnotationRequest>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    let result = json_body(payload)
        .and_then(|request| service.annotate(&principal, &request.user_email, &request.step));
    match result {
        Ok(step) => (StatusCode::CREATED, Json(step)).into_response(),
        Err(err) => err.into_response(),
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AdmissionServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(AdmissionServiceError::from)
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AdmissionServiceError> {
    query
        .map(|Query(params)| params)
        .map_err(AdmissionServiceError::from)
}

impl From<JsonRejection> for AdmissionServiceError {
    fn from(rejection: JsonRejection) -> Self {
        AdmissionServiceError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AdmissionServiceError {
    fn from(rejection: QueryRejection) -> Self {
        AdmissionServiceError::InvalidInput(rejection.body_text())
    }
}

impl AdmissionServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionServiceError::NotFound => StatusCode::NOT_FOUND,
            AdmissionServiceError::InvalidInput(_) | AdmissionServiceError::InvalidStatus(_) => {
                StatusCode::BAD_REQUEST
            }
            AdmissionServiceError::InvalidTransition { .. }
            | AdmissionServiceError::Conflict { .. }
            | AdmissionServiceError::AlreadyRegistered => StatusCode::CONFLICT,
            AdmissionServiceError::Forbidden => StatusCode::FORBIDDEN,
            AdmissionServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AdmissionServiceError::Credential(_) | AdmissionServiceError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AdmissionServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "admission request failed");
        }
        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
