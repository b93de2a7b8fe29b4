use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for admission applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(format!("adm-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Applicant email; the natural key for a user and their single application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalizes case and surrounding whitespace so lookups are stable.
    pub fn parse(raw: &str) -> Result<Self, InvalidEmail> {
        let trimmed = raw.trim();
        let (local, domain) = trimmed.split_once('@').ok_or(InvalidEmail)?;
        if local.is_empty() || domain.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(InvalidEmail);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("email address is not valid")]
pub struct InvalidEmail;

/// Position of an application in the admission pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Interview,
    InterviewScheduled,
    Task,
    TaskSubmitted,
    Payment,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Interview,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Task,
        ApplicationStatus::TaskSubmitted,
        ApplicationStatus::Payment,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    /// Wire literal for the status.
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Task => "task",
            ApplicationStatus::TaskSubmitted => "task_submitted",
            ApplicationStatus::Payment => "payment",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised for any status literal outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status value '{0}'")]
pub struct InvalidStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    /// Matching is exact and case-sensitive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == raw)
            .ok_or_else(|| InvalidStatus(raw.to_string()))
    }
}

/// Terminal outcome an admin can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    pub const fn status(self) -> ApplicationStatus {
        match self {
            Decision::Accepted => ApplicationStatus::Accepted,
            Decision::Rejected => ApplicationStatus::Rejected,
        }
    }

    pub const fn annotation(self) -> &'static str {
        match self {
            Decision::Accepted => "Application Accepted",
            Decision::Rejected => "Application Rejected",
        }
    }
}

impl FromStr for Decision {
    type Err = InvalidStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.parse::<ApplicationStatus>()? {
            ApplicationStatus::Accepted => Ok(Decision::Accepted),
            ApplicationStatus::Rejected => Ok(Decision::Rejected),
            _ => Err(InvalidStatus(raw.to_string())),
        }
    }
}

/// Immutable audit entry in an application's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub sequence: u64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_status: Option<ApplicationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_status: Option<ApplicationStatus>,
}

/// A timeline entry that has not been committed yet; the log assigns the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineDraft {
    pub description: String,
    pub from_status: Option<ApplicationStatus>,
    pub to_status: Option<ApplicationStatus>,
}

impl TimelineDraft {
    pub fn note(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            from_status: None,
            to_status: None,
        }
    }

    pub fn transition(
        description: impl Into<String>,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Self {
        Self {
            description: description.into(),
            from_status: Some(from),
            to_status: Some(to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
}

/// Completed monetary transaction recorded by the confirmation handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub amount_minor: u64,
    pub currency: String,
    pub method: String,
    pub status: PaymentStatus,
    /// Processor transaction reference; unique across all applications.
    pub reference: String,
    pub details: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// Applicant profile fields the applicant may edit after registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub qualification: Option<Qualification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Qualification {
    HighSchool,
    College,
    Professional,
    Other,
}

/// bcrypt digest of an applicant password, in modular crypt format.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Work factor used for stored credentials.
    pub const DEFAULT_COST: u32 = 10;

    pub fn derive(password: &str, cost: u32) -> Result<Self, bcrypt::BcryptError> {
        bcrypt::hash(password, cost).map(Self)
    }

    /// A malformed stored digest never matches.
    pub fn verify(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.0).unwrap_or(false)
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

/// Identity and profile owned by an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: Email,
    #[serde(skip_serializing)]
    pub credential: Option<CredentialHash>,
    pub profile: Profile,
    pub course: String,
    pub created_at: DateTime<Utc>,
}

/// Interview slot picked by an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSlot {
    pub date: NaiveDate,
    pub time_slot: String,
}

/// Work handed in for the course task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmission {
    #[serde(default)]
    pub task_description: Option<String>,
    #[serde(default)]
    pub task_link: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Course-specific assignment shown to applicants in the task stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDetails {
    pub title: String,
    pub description: String,
    pub deadline: &'static str,
}

impl TaskDetails {
    pub fn for_course(course: &str) -> Self {
        Self {
            title: format!("{course} Project Proposal"),
            description: format!(
                "Create a project proposal related to {course}. The proposal should include \
                 your project idea, target audience, implementation plan, and expected outcomes."
            ),
            deadline: "Within 7 days of application",
        }
    }
}
