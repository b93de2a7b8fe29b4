use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::workflows::admission::domain::{
    ApplicationId, ApplicationStatus, Email, Gender, Profile, Qualification, User,
};
use crate::workflows::admission::repository::{
    AdmissionRepository, ApplicationChange, ApplicationRecord, Registration, RepositoryError,
};
use crate::workflows::admission::{
    admission_router, AdmissionService, InMemoryAdmissionRepository, Principal, RegistrationForm,
};

pub(super) const APPLICANT: &str = "asha@example.com";
pub(super) const ADMIN: &str = "registrar@example.com";
pub(super) const COURSE: &str = "creator-marketer";
/// bcrypt's minimum work factor keeps registrations fast under test.
pub(super) const TEST_CREDENTIAL_COST: u32 = 4;

/// Advances one minute per reading so every write gets a distinct timestamp.
pub(super) struct SteppingClock(Mutex<DateTime<Utc>>);

impl SteppingClock {
    pub(super) fn starting_at(start: DateTime<Utc>) -> Self {
        Self(Mutex::new(start))
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::starting_at(
            Utc.with_ymd_and_hms(2025, 4, 28, 9, 0, 0)
                .single()
                .expect("valid start"),
        )
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut now = self.0.lock().expect("clock mutex");
        let current = *now;
        *now = current + Duration::minutes(1);
        current
    }
}

pub(super) struct UnavailableRepository;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl AdmissionRepository for UnavailableRepository {
    fn register(&self, _registration: Registration) -> Result<Registration, RepositoryError> {
        unavailable()
    }

    fn user(&self, _email: &Email) -> Result<Option<User>, RepositoryError> {
        unavailable()
    }

    fn update_profile(&self, _email: &Email, _profile: Profile) -> Result<User, RepositoryError> {
        unavailable()
    }

    fn application_for(
        &self,
        _email: &Email,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        unavailable()
    }

    fn application(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        unavailable()
    }

    fn applications(
        &self,
        _status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        unavailable()
    }

    fn apply(
        &self,
        _id: &ApplicationId,
        _expected_version: u64,
        _change: ApplicationChange,
    ) -> Result<ApplicationRecord, RepositoryError> {
        unavailable()
    }
}

pub(super) type MemoryService = AdmissionService<InMemoryAdmissionRepository>;

pub(super) fn build_service() -> (Arc<MemoryService>, Arc<InMemoryAdmissionRepository>) {
    let repository = Arc::new(InMemoryAdmissionRepository::default());
    let service = Arc::new(
        AdmissionService::new(repository.clone(), Arc::new(SteppingClock::default()))
            .with_credential_cost(TEST_CREDENTIAL_COST),
    );
    (service, repository)
}

pub(super) fn unavailable_service() -> Arc<AdmissionService<UnavailableRepository>> {
    Arc::new(AdmissionService::new(
        Arc::new(UnavailableRepository),
        Arc::new(SteppingClock::default()),
    ))
}

pub(super) fn email(raw: &str) -> Email {
    Email::parse(raw).expect("valid email")
}

pub(super) fn applicant() -> Principal {
    Principal::applicant(email(APPLICANT))
}

pub(super) fn admin() -> Principal {
    Principal::admin(email(ADMIN))
}

pub(super) fn registration_form(address: &str) -> RegistrationForm {
    RegistrationForm {
        email: address.to_string(),
        password: "s3cret-pass".to_string(),
        name: "Asha Rao".to_string(),
        age: Some(22),
        gender: Some(Gender::Female),
        qualification: Some(Qualification::College),
        course_choice: COURSE.to_string(),
    }
}

/// Registers the default applicant and returns the service with its store.
pub(super) fn registered_service() -> (Arc<MemoryService>, Arc<InMemoryAdmissionRepository>) {
    let (service, repository) = build_service();
    service
        .register(registration_form(APPLICANT))
        .expect("registration succeeds");
    (service, repository)
}

pub(super) fn stored_record(repository: &InMemoryAdmissionRepository) -> ApplicationRecord {
    repository
        .application_for(&email(APPLICANT))
        .expect("repository available")
        .expect("application stored")
}

pub(super) fn router_for(service: Arc<MemoryService>) -> axum::Router {
    admission_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}
