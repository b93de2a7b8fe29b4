use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use serde::Deserialize;
use tracing::{info, warn};

use super::auth::Principal;
use super::domain::{
    ApplicationStatus, CredentialHash, Decision, Email, Gender, InterviewSlot, InvalidStatus,
    Profile, Qualification, TaskDetails, TaskSubmission, TimelineDraft, TimelineStep, User,
};
use super::policy::TransitionPolicy;
use super::repository::{
    AdmissionRepository, ApplicationChange, ApplicationRecord, ApplicationStatusView,
    ApplicationSummary, Registration, RepositoryError,
};
use super::timeline::TimelineOrder;

const MIN_PASSWORD_LEN: usize = 6;
const MIN_APPLICANT_AGE: u32 = 18;
const MAX_PROFILE_AGE: u32 = 120;

/// Registration payload; every field is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub qualification: Option<Qualification>,
    #[serde(default)]
    pub course_choice: String,
}

/// Profile edit; omitted optional fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub qualification: Option<Qualification>,
}

/// Admin override of an application's status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransitionRequest {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Email and password pair checked on behalf of the identity provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time_slot: String,
}

/// Application status pipeline: registration, applicant self-service, and the admin console.
pub struct AdmissionService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock + Send + Sync>,
    policy: TransitionPolicy,
    credential_cost: u32,
}

impl<R> AdmissionService<R>
where
    R: AdmissionRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            repository,
            clock,
            policy: TransitionPolicy,
            credential_cost: CredentialHash::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor applied to new credentials.
    pub fn with_credential_cost(mut self, cost: u32) -> Self {
        self.credential_cost = cost;
        self
    }

    /// Create the user and their `pending` application in one write.
    pub fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<ApplicationStatusView, AdmissionServiceError> {
        let RegistrationForm {
            email,
            password,
            name,
            age,
            gender,
            qualification,
            course_choice,
        } = form;

        let name = name.trim().to_string();
        let course = course_choice.trim().to_string();
        let (Some(age), Some(gender), Some(qualification)) = (age, gender, qualification) else {
            return Err(invalid_input("All fields are required"));
        };
        if email.trim().is_empty() || password.is_empty() || name.is_empty() || course.is_empty()
        {
            return Err(invalid_input("All fields are required"));
        }

        let email = Email::parse(&email).map_err(|err| invalid_input(err.to_string()))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if !(MIN_APPLICANT_AGE..=MAX_PROFILE_AGE).contains(&age) {
            return Err(invalid_input(format!(
                "Applicants must be between {MIN_APPLICANT_AGE} and {MAX_PROFILE_AGE} years old"
            )));
        }

        let credential = CredentialHash::derive(&password, self.credential_cost)?;
        let now = self.clock.utc();
        let user = User {
            email: email.clone(),
            credential: Some(credential),
            profile: Profile {
                name,
                age: Some(age as u8),
                gender: Some(gender),
                qualification: Some(qualification),
            },
            course: course.clone(),
            created_at: now,
        };
        let application = ApplicationRecord::opened(email, &course, now);

        let stored = self
            .repository
            .register(Registration { user, application })
            .map_err(|err| match err {
                RepositoryError::Conflict => AdmissionServiceError::AlreadyRegistered,
                other => other.into(),
            })?;

        info!(
            application_id = %stored.application.id,
            course = %stored.user.course,
            "application registered"
        );
        Ok(stored.application.status_view(TimelineOrder::NewestFirst))
    }

    /// Password check backing the identity provider's credentials sign-in.
    pub fn verify_credentials(
        &self,
        request: CredentialsRequest,
    ) -> Result<User, AdmissionServiceError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(invalid_input("Email and password are required"));
        }
        let email =
            Email::parse(&request.email).map_err(|_| AdmissionServiceError::InvalidCredentials)?;
        let user = self
            .repository
            .user(&email)?
            .ok_or(AdmissionServiceError::InvalidCredentials)?;

        let verified = user
            .credential
            .as_ref()
            .is_some_and(|credential| credential.verify(&request.password));
        if !verified {
            warn!(email = %email, "credential check rejected");
            return Err(AdmissionServiceError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Status view for the principal, or for `target` when the principal is an admin.
    pub fn status(
        &self,
        principal: &Principal,
        target: Option<&str>,
        order: TimelineOrder,
    ) -> Result<ApplicationStatusView, AdmissionServiceError> {
        let email = resolve_target(principal, target)?;
        let record = self.load(&email)?;
        Ok(record.status_view(order))
    }

    pub fn timeline(
        &self,
        principal: &Principal,
        target: Option<&str>,
        order: TimelineOrder,
    ) -> Result<Vec<TimelineStep>, AdmissionServiceError> {
        let email = resolve_target(principal, target)?;
        let record = self.load(&email)?;
        Ok(record.timeline.ordered(order))
    }

    /// Admin override: any member of the status set is accepted from any state.
    pub fn transition(
        &self,
        principal: &Principal,
        request: TransitionRequest,
    ) -> Result<ApplicationStatusView, AdmissionServiceError> {
        require_admin(principal)?;
        let (email, raw_status) = match request.status.as_deref() {
            Some(status) if !request.user_email.trim().is_empty() => {
                (parse_email(&request.user_email)?, status)
            }
            _ => return Err(invalid_input("User email and status are required")),
        };
        let target: ApplicationStatus = raw_status.parse()?;
        let record = self.load(&email)?;
        check_version(&record, request.expected_version)?;

        self.warn_if_outside_pipeline(&record, target, principal);
        let step = TimelineDraft::transition(
            status_update_description(target, request.note.as_deref()),
            record.status,
            target,
        );
        let updated = self.commit(&record, target, vec![step])?;

        info!(
            application_id = %updated.id,
            from = %record.status,
            to = %target,
            actor = %principal.email,
            "application status updated"
        );
        Ok(updated.status_view(TimelineOrder::NewestFirst))
    }

    /// Accept or reject: the status update and its annotation commit together.
    pub fn decide(
        &self,
        principal: &Principal,
        request: DecisionRequest,
    ) -> Result<ApplicationStatusView, AdmissionServiceError> {
        require_admin(principal)?;
        let (email, raw_decision) = match request.decision.as_deref() {
            Some(decision) if !request.user_email.trim().is_empty() => {
                (parse_email(&request.user_email)?, decision)
            }
            _ => return Err(invalid_input("User email and decision are required")),
        };
        let decision: Decision = raw_decision.parse()?;
        let record = self.load(&email)?;
        check_version(&record, request.expected_version)?;

        let target = decision.status();
        self.warn_if_outside_pipeline(&record, target, principal);
        let steps = vec![
            TimelineDraft::transition(
                status_update_description(target, request.note.as_deref()),
                record.status,
                target,
            ),
            TimelineDraft::note(decision.annotation()),
        ];
        let updated = self.commit(&record, target, steps)?;

        info!(
            application_id = %updated.id,
            decision = %target,
            actor = %principal.email,
            "admission decision recorded"
        );
        Ok(updated.status_view(TimelineOrder::NewestFirst))
    }

    /// Free-text admin annotation; status is unchanged.
    pub fn annotate(
        &self,
        principal: &Principal,
        user_email: &str,
        step: &str,
    ) -> Result<TimelineStep, AdmissionServiceError> {
        require_admin(principal)?;
        let step = step.trim();
        if step.is_empty() {
            return Err(invalid_input("User email and step description are required"));
        }
        let email = parse_email(user_email)?;
        let record = self.load(&email)?;

        let updated = self.commit(&record, record.status, vec![TimelineDraft::note(step)])?;
        let appended = updated.timeline.entries().last().cloned().ok_or_else(|| {
            RepositoryError::Unavailable("timeline entry missing after append".to_string())
        })?;
        Ok(appended)
    }

    pub fn list_applications(
        &self,
        principal: &Principal,
        status: Option<&str>,
    ) -> Result<Vec<ApplicationSummary>, AdmissionServiceError> {
        require_admin(principal)?;
        let filter = status
            .filter(|raw| !raw.is_empty() && *raw != "all")
            .map(str::parse::<ApplicationStatus>)
            .transpose()?;

        let records = self.repository.applications(filter)?;
        let mut summaries = Vec::with_capacity(records.len());
        for record in &records {
            if let Some(user) = self.repository.user(&record.applicant)? {
                summaries.push(ApplicationSummary::new(&user, record));
            }
        }
        Ok(summaries)
    }

    pub fn schedule_interview(
        &self,
        principal: &Principal,
        request: InterviewRequest,
    ) -> Result<ApplicationStatusView, AdmissionServiceError> {
        let time_slot = request.time_slot.trim();
        if request.date.trim().is_empty() || time_slot.is_empty() {
            return Err(invalid_input("Date and time slot are required"));
        }
        let slot = InterviewSlot {
            date: NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d")
                .map_err(|_| invalid_input("Interview date must be formatted as YYYY-MM-DD"))?,
            time_slot: time_slot.to_string(),
        };

        let description = format!(
            "Interview Scheduled for {} at {}",
            slot.date.format("%Y-%m-%d"),
            slot.time_slot
        );
        self.advance(principal, ApplicationStatus::InterviewScheduled, description)
    }

    /// Records the submission and returns the refreshed view from the same write.
    pub fn submit_task(
        &self,
        principal: &Principal,
        submission: TaskSubmission,
    ) -> Result<ApplicationStatusView, AdmissionServiceError> {
        let written = non_blank(submission.task_description.as_deref());
        let link = non_blank(submission.task_link.as_deref());
        let kind = match (written, link) {
            (Some(_), _) => "Written submission",
            (None, Some(_)) => "Link submission",
            (None, None) => return Err(invalid_input("Task description or link is required")),
        };

        let description = match non_blank(submission.comments.as_deref()) {
            Some(comments) => format!("Task Submitted: {kind} with comments: {comments}"),
            None => format!("Task Submitted: {kind}"),
        };
        self.advance(principal, ApplicationStatus::TaskSubmitted, description)
    }

    pub fn task_details(&self, principal: &Principal) -> Result<TaskDetails, AdmissionServiceError> {
        let user = self.load_user(&principal.email)?;
        Ok(TaskDetails::for_course(&user.course))
    }

    pub fn profile(&self, principal: &Principal) -> Result<User, AdmissionServiceError> {
        self.load_user(&principal.email)
    }

    pub fn update_profile(
        &self,
        principal: &Principal,
        form: ProfileForm,
    ) -> Result<User, AdmissionServiceError> {
        let name = form.name.trim();
        if name.chars().count() < 2 {
            return Err(invalid_input("Name must be at least 2 characters."));
        }
        if let Some(age) = form.age {
            if !(1..=MAX_PROFILE_AGE).contains(&age) {
                return Err(invalid_input(format!(
                    "Age must be between 1 and {MAX_PROFILE_AGE}"
                )));
            }
        }

        let current = self.load_user(&principal.email)?;
        let profile = Profile {
            name: name.to_string(),
            age: form.age.map(|age| age as u8).or(current.profile.age),
            gender: form.gender.or(current.profile.gender),
            qualification: form.qualification.or(current.profile.qualification),
        };
        Ok(self.repository.update_profile(&principal.email, profile)?)
    }

    /// Applicant-driven move; refused unless the pipeline table permits it.
    fn advance(
        &self,
        principal: &Principal,
        target: ApplicationStatus,
        description: String,
    ) -> Result<ApplicationStatusView, AdmissionServiceError> {
        let record = self.load(&principal.email)?;
        if !self.policy.permits(record.status, target) {
            return Err(AdmissionServiceError::InvalidTransition {
                from: record.status,
                to: target,
            });
        }

        let step = TimelineDraft::transition(description, record.status, target);
        let updated = self.commit(&record, target, vec![step])?;
        info!(
            application_id = %updated.id,
            from = %record.status,
            to = %target,
            "applicant advanced application"
        );
        Ok(updated.status_view(TimelineOrder::NewestFirst))
    }

    fn commit(
        &self,
        record: &ApplicationRecord,
        status: ApplicationStatus,
        steps: Vec<TimelineDraft>,
    ) -> Result<ApplicationRecord, AdmissionServiceError> {
        let change = ApplicationChange {
            status,
            steps,
            payment: None,
            at: self.clock.utc(),
        };
        Ok(self.repository.apply(&record.id, record.version, change)?)
    }

    fn warn_if_outside_pipeline(
        &self,
        record: &ApplicationRecord,
        target: ApplicationStatus,
        principal: &Principal,
    ) {
        if !self.policy.permits(record.status, target) {
            warn!(
                application_id = %record.id,
                from = %record.status,
                to = %target,
                actor = %principal.email,
                "admin override outside the admission pipeline"
            );
        }
    }

    fn load(&self, email: &Email) -> Result<ApplicationRecord, AdmissionServiceError> {
        self.repository
            .application_for(email)?
            .ok_or(AdmissionServiceError::NotFound)
    }

    fn load_user(&self, email: &Email) -> Result<User, AdmissionServiceError> {
        self.repository
            .user(email)?
            .ok_or(AdmissionServiceError::NotFound)
    }
}

fn status_update_description(status: ApplicationStatus, note: Option<&str>) -> String {
    match non_blank(note) {
        Some(note) => format!("Status updated to {status}: {note}"),
        None => format!("Status updated to {status}"),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn invalid_input(message: impl Into<String>) -> AdmissionServiceError {
    AdmissionServiceError::InvalidInput(message.into())
}

fn parse_email(raw: &str) -> Result<Email, AdmissionServiceError> {
    if raw.trim().is_empty() {
        return Err(invalid_input("User email is required"));
    }
    Email::parse(raw).map_err(|err| invalid_input(err.to_string()))
}

fn require_admin(principal: &Principal) -> Result<(), AdmissionServiceError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AdmissionServiceError::Forbidden)
    }
}

fn resolve_target(
    principal: &Principal,
    target: Option<&str>,
) -> Result<Email, AdmissionServiceError> {
    match target.filter(|raw| !raw.trim().is_empty()) {
        None => Ok(principal.email.clone()),
        Some(raw) => {
            let email = parse_email(raw)?;
            if email == principal.email || principal.is_admin() {
                Ok(email)
            } else {
                Err(AdmissionServiceError::Forbidden)
            }
        }
    }
}

fn check_version(
    record: &ApplicationRecord,
    expected: Option<u64>,
) -> Result<(), AdmissionServiceError> {
    match expected {
        Some(expected) if expected != record.version => Err(AdmissionServiceError::Conflict {
            expected,
            actual: record.version,
        }),
        _ => Ok(()),
    }
}

/// Error raised by the admission service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionServiceError {
    #[error("Application not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
    #[error("cannot move application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("application changed concurrently (expected version {expected}, found {actual})")]
    Conflict { expected: u64, actual: u64 },
    #[error("User with this email already exists")]
    AlreadyRegistered,
    #[error("admin role required")]
    Forbidden,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("failed to hash credential: {0}")]
    Credential(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AdmissionServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::VersionMismatch { expected, actual } => {
                Self::Conflict { expected, actual }
            }
            other => Self::Repository(other),
        }
    }
}
