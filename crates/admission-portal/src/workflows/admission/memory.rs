use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{ApplicationId, ApplicationStatus, Email, Profile, User};
use super::repository::{
    AdmissionRepository, ApplicationChange, ApplicationRecord, Registration, RepositoryError,
};

#[derive(Default)]
struct Store {
    users: BTreeMap<Email, User>,
    applications: HashMap<ApplicationId, ApplicationRecord>,
    by_email: HashMap<Email, ApplicationId>,
    payment_references: HashSet<String>,
}

/// Process-local store; one mutex serializes every write.
#[derive(Default, Clone)]
pub struct InMemoryAdmissionRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryAdmissionRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Store>, RepositoryError> {
        self.store
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl AdmissionRepository for InMemoryAdmissionRepository {
    fn register(&self, registration: Registration) -> Result<Registration, RepositoryError> {
        let mut store = self.lock()?;
        let email = registration.user.email.clone();
        if store.users.contains_key(&email) {
            return Err(RepositoryError::Conflict);
        }

        let id = registration.application.id.clone();
        store.users.insert(email.clone(), registration.user.clone());
        store
            .applications
            .insert(id.clone(), registration.application.clone());
        store.by_email.insert(email, id);
        Ok(registration)
    }

    fn user(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(email).cloned())
    }

    fn update_profile(&self, email: &Email, profile: Profile) -> Result<User, RepositoryError> {
        let mut store = self.lock()?;
        let user = store
            .users
            .get_mut(email)
            .ok_or(RepositoryError::NotFound)?;
        user.profile = profile;
        Ok(user.clone())
    }

    fn application_for(&self, email: &Email) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let store = self.lock()?;
        Ok(store
            .by_email
            .get(email)
            .and_then(|id| store.applications.get(id))
            .cloned())
    }

    fn application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let store = self.lock()?;
        let mut records: Vec<_> = store
            .applications
            .values()
            .filter(|record| status.map_or(true, |wanted| record.status == wanted))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.applicant.cmp(&b.applicant));
        Ok(records)
    }

    fn apply(
        &self,
        id: &ApplicationId,
        expected_version: u64,
        change: ApplicationChange,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut store = self.lock()?;

        if let Some(payment) = &change.payment {
            if store.payment_references.contains(&payment.reference) {
                return Err(RepositoryError::DuplicatePaymentReference(
                    payment.reference.clone(),
                ));
            }
        }

        let record = store
            .applications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        if record.version != expected_version {
            return Err(RepositoryError::VersionMismatch {
                expected: expected_version,
                actual: record.version,
            });
        }

        let ApplicationChange {
            status,
            steps,
            payment,
            at,
        } = change;

        record.status = status;
        for step in steps {
            record.timeline.append(step, at);
        }
        let reference = payment.as_ref().map(|payment| payment.reference.clone());
        if let Some(payment) = payment {
            record.payments.push(payment);
        }
        record.version += 1;
        let updated = record.clone();

        if let Some(reference) = reference {
            store.payment_references.insert(reference);
        }
        Ok(updated)
    }
}
