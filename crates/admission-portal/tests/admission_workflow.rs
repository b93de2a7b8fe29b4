use std::sync::Arc;

use admission_portal::workflows::admission::{
    admission_router, AdmissionService, InMemoryAdmissionRepository, PRINCIPAL_EMAIL_HEADER,
    PRINCIPAL_ROLE_HEADER,
};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mockable::DefaultClock;
use serde_json::{json, Value};
use tower::ServiceExt;

const APPLICANT: &str = "meera@example.com";
const ADMIN: &str = "registrar@example.com";

fn portal() -> Router {
    let repository = Arc::new(InMemoryAdmissionRepository::default());
    admission_router(Arc::new(
        AdmissionService::new(repository, Arc::new(DefaultClock)).with_credential_cost(4),
    ))
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    as_user: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((email, role)) = as_user {
        builder = builder
            .header(PRINCIPAL_EMAIL_HEADER, email)
            .header(PRINCIPAL_ROLE_HEADER, role);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request builds");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn timeline_len(view: &Value) -> usize {
    view["timeline"].as_array().map(Vec::len).unwrap_or_default()
}

#[tokio::test]
async fn interview_track_from_registration_to_acceptance() {
    let router = portal();
    let applicant = Some((APPLICANT, "applicant"));
    let admin = Some((ADMIN, "admin"));

    let (status, view) = call(
        &router,
        "POST",
        "/api/v1/admission/register",
        None,
        Some(json!({
            "email": APPLICANT,
            "password": "s3cret-pass",
            "name": "Meera Iyer",
            "age": 24,
            "gender": "female",
            "qualification": "professional",
            "course_choice": "creator-marketer"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["status"], "pending");
    assert_eq!(timeline_len(&view), 1);

    let (status, view) = call(
        &router,
        "POST",
        "/api/v1/admin/applications/status",
        admin,
        Some(json!({ "user_email": APPLICANT, "status": "interview" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timeline_len(&view), 2);

    let (status, view) = call(
        &router,
        "POST",
        "/api/v1/application/schedule-interview",
        applicant,
        Some(json!({ "date": "2025-05-01", "time_slot": "10:00 AM" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "interview_scheduled");
    assert_eq!(timeline_len(&view), 3);
    let newest = view["timeline"][0]["description"]
        .as_str()
        .expect("description");
    assert!(newest.contains("2025-05-01") && newest.contains("10:00 AM"));

    let (status, _) = call(
        &router,
        "POST",
        "/api/v1/admin/applications/decision",
        admin,
        Some(json!({ "user_email": APPLICANT, "decision": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, view) = call(
        &router,
        "GET",
        "/api/v1/application/status",
        applicant,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "accepted");
    assert_eq!(timeline_len(&view), 5);
    assert_eq!(view["timeline"][0]["description"], "Application Accepted");
    assert_eq!(
        view["next_step"],
        "Congratulations! Your application has been accepted and enrollment is complete."
    );

    let (status, timeline) = call(
        &router,
        "GET",
        "/api/v1/application/timeline?order=oldest_first",
        applicant,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        timeline[0]["description"],
        "Application Submitted for creator-marketer"
    );
}

#[tokio::test]
async fn applicants_cannot_read_each_other() {
    let router = portal();
    for address in [APPLICANT, "other@example.com"] {
        let (status, _) = call(
            &router,
            "POST",
            "/api/v1/admission/register",
            None,
            Some(json!({
                "email": address,
                "password": "s3cret-pass",
                "name": "Applicant",
                "age": 30,
                "gender": "other",
                "qualification": "high-school",
                "course_choice": "creator-marketer"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = call(
        &router,
        "GET",
        "/api/v1/application/status?email=other@example.com",
        Some((APPLICANT, "applicant")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, view) = call(
        &router,
        "GET",
        "/api/v1/application/status?email=other@example.com",
        Some((ADMIN, "admin")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["email"], "other@example.com");
}
