use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::Email;

/// Header carrying the email of the principal authenticated upstream.
pub const PRINCIPAL_EMAIL_HEADER: &str = "x-authenticated-email";
/// Optional header carrying the principal's role; absent means applicant.
pub const PRINCIPAL_ROLE_HEADER: &str = "x-authenticated-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Admin,
}

/// Identity handed to every service call. Construction is trusted: the identity
/// provider in front of the portal has already authenticated the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub email: Email,
    pub role: Role,
}

impl Principal {
    pub fn applicant(email: Email) -> Self {
        Self {
            email,
            role: Role::Applicant,
        }
    }

    pub fn admin(email: Email) -> Self {
        Self {
            email,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalRejection {
    #[error("Unauthorized")]
    Missing,
    #[error("Unauthorized: unrecognized role")]
    UnknownRole,
}

impl IntoResponse for PrincipalRejection {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = PrincipalRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(PRINCIPAL_EMAIL_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Email::parse(raw).ok())
            .ok_or(PrincipalRejection::Missing)?;

        let role = match parts
            .headers
            .get(PRINCIPAL_ROLE_HEADER)
            .map(|value| value.to_str().map(str::trim))
        {
            None => Role::Applicant,
            Some(Ok(raw)) if raw.eq_ignore_ascii_case("admin") => Role::Admin,
            Some(Ok(raw)) if raw.eq_ignore_ascii_case("applicant") || raw.is_empty() => {
                Role::Applicant
            }
            Some(_) => return Err(PrincipalRejection::UnknownRole),
        };

        Ok(Principal { email, role })
    }
}
