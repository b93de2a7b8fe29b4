use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationStatus, Email, Payment, Profile, TimelineDraft, TimelineStep, User,
};
use super::policy::next_step_for;
use super::timeline::{TimelineLog, TimelineOrder};

/// The admission aggregate as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub applicant: Email,
    pub status: ApplicationStatus,
    pub version: u64,
    pub timeline: TimelineLog,
    pub payments: Vec<Payment>,
}

impl ApplicationRecord {
    /// Fresh `pending` application with its opening timeline entry.
    pub fn opened(applicant: Email, course: &str, at: DateTime<Utc>) -> Self {
        let mut timeline = TimelineLog::default();
        timeline.append(
            TimelineDraft {
                description: format!("Application Submitted for {course}"),
                from_status: None,
                to_status: Some(ApplicationStatus::Pending),
            },
            at,
        );

        Self {
            id: ApplicationId::generate(),
            applicant,
            status: ApplicationStatus::Pending,
            version: 1,
            timeline,
            payments: Vec::new(),
        }
    }

    pub fn has_payment_reference(&self, reference: &str) -> bool {
        self.payments
            .iter()
            .any(|payment| payment.reference == reference)
    }

    pub fn status_view(&self, order: TimelineOrder) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            email: self.applicant.clone(),
            status: self.status,
            version: self.version,
            next_step: next_step_for(self.status),
            timeline: self.timeline.ordered(order),
        }
    }
}

/// Status change committed together with its timeline entries and optional payment.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationChange {
    pub status: ApplicationStatus,
    pub steps: Vec<TimelineDraft>,
    pub payment: Option<Payment>,
    pub at: DateTime<Utc>,
}

/// Registered applicant together with the application created alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub user: User,
    pub application: ApplicationRecord,
}

/// Storage abstraction so the services can be exercised in isolation.
///
/// Each method is one atomic operation. `apply` is a compare-and-swap on
/// `expected_version`: it commits only when the stored version still matches
/// and returns the updated record with the version incremented.
pub trait AdmissionRepository: Send + Sync {
    fn register(&self, registration: Registration) -> Result<Registration, RepositoryError>;
    fn user(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    fn update_profile(&self, email: &Email, profile: Profile) -> Result<User, RepositoryError>;
    fn application_for(&self, email: &Email) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn application(&self, id: &ApplicationId)
        -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn apply(
        &self,
        id: &ApplicationId,
        expected_version: u64,
        change: ApplicationChange,
    ) -> Result<ApplicationRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("application changed since version {expected} (now {actual})")]
    VersionMismatch { expected: u64, actual: u64 },
    #[error("payment reference '{0}' was already recorded")]
    DuplicatePaymentReference(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub email: Email,
    pub status: ApplicationStatus,
    pub version: u64,
    pub next_step: &'static str,
    pub timeline: Vec<TimelineStep>,
}

/// Row shown in the admin console.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub application_id: ApplicationId,
    pub email: Email,
    pub name: String,
    pub course: String,
    pub status: ApplicationStatus,
    pub version: u64,
    pub payments: usize,
    pub timeline: Vec<TimelineStep>,
}

impl ApplicationSummary {
    pub fn new(user: &User, record: &ApplicationRecord) -> Self {
        Self {
            application_id: record.id.clone(),
            email: record.applicant.clone(),
            name: user.profile.name.clone(),
            course: user.course.clone(),
            status: record.status,
            version: record.version,
            payments: record.payments.len(),
            timeline: record.timeline.ordered(TimelineOrder::NewestFirst),
        }
    }
}
