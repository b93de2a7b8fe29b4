//! Application status pipeline and timeline audit log.
//!
//! Every status change goes through [`AdmissionService`], which commits the new
//! status and its timeline entries in a single versioned repository write.

pub mod auth;
pub mod domain;
pub mod memory;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use auth::{
    Principal, PrincipalRejection, Role, PRINCIPAL_EMAIL_HEADER, PRINCIPAL_ROLE_HEADER,
};
pub use domain::{
    ApplicationId, ApplicationStatus, CredentialHash, Decision, Email, Gender, InterviewSlot,
    InvalidEmail, InvalidStatus, Payment, PaymentStatus, Profile, Qualification, TaskDetails,
    TaskSubmission, TimelineDraft, TimelineStep, User,
};
pub use memory::InMemoryAdmissionRepository;
pub use policy::{next_step, next_step_for, TransitionPolicy};
pub use repository::{
    AdmissionRepository, ApplicationChange, ApplicationRecord, ApplicationStatusView,
    ApplicationSummary, Registration, RepositoryError,
};
pub use router::admission_router;
pub use service::{
    AdmissionService, AdmissionServiceError, CredentialsRequest, DecisionRequest,
    InterviewRequest, ProfileForm, RegistrationForm, TransitionRequest,
};
pub use timeline::{TimelineLog, TimelineOrder};
