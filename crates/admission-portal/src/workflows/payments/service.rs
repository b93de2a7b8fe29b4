use std::collections::BTreeMap;
use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::checkout::{CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError};
use super::signature::{SignatureError, WebhookVerifier};
use super::webhook::{ProcessorEvent, APPLICATION_ID_METADATA, USER_EMAIL_METADATA};
use crate::workflows::admission::{
    AdmissionRepository, ApplicationChange, ApplicationId, ApplicationRecord, ApplicationStatus,
    Payment, PaymentStatus, Principal, RepositoryError, TimelineDraft, TransitionPolicy,
};

const PRODUCT_NAME: &str = "LIT School Course Enrollment";
const PAYMENT_METHOD: &str = "stripe";
const PAYMENT_CONFIRMED_STEP: &str = "Payment completed and verified";
pub(super) const MAX_CONFIRM_ATTEMPTS: usize = 3;

/// Pricing and redirect targets for hosted checkouts.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub enrollment_fee_minor: u64,
    pub currency: String,
    pub public_url: String,
}

/// What a verified webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Recorded {
        application_id: ApplicationId,
        reference: String,
    },
    AlreadyProcessed {
        reference: String,
    },
    Ignored {
        reason: String,
    },
}

impl WebhookOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, WebhookOutcome::Recorded { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStarted {
    pub session_id: String,
    pub checkout_url: Option<String>,
}

/// Checkout creation and processor confirmation for enrollment fees.
pub struct PaymentService<R, G> {
    repository: Arc<R>,
    gateway: Arc<G>,
    verifier: WebhookVerifier,
    clock: Arc<dyn Clock + Send + Sync>,
    settings: CheckoutSettings,
    policy: TransitionPolicy,
}

impl<R, G> PaymentService<R, G>
where
    R: AdmissionRepository + 'static,
    G: CheckoutGateway + 'static,
{
    pub fn new(
        repository: Arc<R>,
        gateway: Arc<G>,
        verifier: WebhookVerifier,
        clock: Arc<dyn Clock + Send + Sync>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            repository,
            gateway,
            verifier,
            clock,
            settings,
            policy: TransitionPolicy,
        }
    }

    /// Opens a hosted checkout for an application awaiting payment.
    pub async fn create_checkout(
        &self,
        principal: &Principal,
    ) -> Result<CheckoutStarted, PaymentServiceError> {
        let user = self
            .repository
            .user(&principal.email)?
            .ok_or(PaymentServiceError::NotFound)?;
        let record = self
            .repository
            .application_for(&principal.email)?
            .ok_or(PaymentServiceError::NotFound)?;
        if record.status != ApplicationStatus::Payment {
            return Err(PaymentServiceError::NotAwaitingPayment(record.status));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert(APPLICATION_ID_METADATA.to_string(), record.id.0.clone());
        metadata.insert(
            USER_EMAIL_METADATA.to_string(),
            user.email.as_str().to_string(),
        );

        let base = &self.settings.public_url;
        let request = CheckoutRequest {
            amount_minor: self.settings.enrollment_fee_minor,
            currency: self.settings.currency.clone(),
            product_name: PRODUCT_NAME.to_string(),
            description: format!("Enrollment fee for {}", user.course),
            success_url: format!("{base}/payment-success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel_url: format!("{base}/payment?canceled=true"),
            metadata,
        };

        let session: CheckoutSession = match self.gateway.create_session(request).await {
            Ok(session) => session,
            Err(err) => {
                warn!(application_id = %record.id, error = %err, "checkout session failed");
                return Err(err.into());
            }
        };

        info!(application_id = %record.id, session_id = %session.id, "checkout session created");
        Ok(CheckoutStarted {
            session_id: session.id,
            checkout_url: session.url,
        })
    }

    /// Verifies and applies a processor notification. Redelivery is a no-op.
    pub fn confirm(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentServiceError> {
        let now = self.clock.utc();
        if let Err(err) = self.verifier.verify(payload, signature, now) {
            warn!(error = %err, "webhook signature verification failed");
            return Err(err.into());
        }

        let event: ProcessorEvent = serde_json::from_slice(payload)
            .map_err(|err| PaymentServiceError::InvalidPayload(err.to_string()))?;
        let Some(checkout) = event
            .completed_checkout()
            .map_err(|err| PaymentServiceError::InvalidPayload(err.to_string()))?
        else {
            return Ok(WebhookOutcome::Ignored {
                reason: format!("unhandled event type {}", event.kind),
            });
        };

        let Some(application_id) = checkout.application_id().map(str::to_string) else {
            warn!(event_id = %event.id, "completed checkout without application metadata");
            return Ok(WebhookOutcome::Ignored {
                reason: "checkout carries no application id".to_string(),
            });
        };
        let application_id = ApplicationId(application_id);
        let reference = checkout.reference();

        for _ in 0..MAX_CONFIRM_ATTEMPTS {
            let record = self
                .repository
                .application(&application_id)?
                .ok_or(PaymentServiceError::NotFound)?;
            if record.has_payment_reference(&reference) {
                return Ok(already_processed(&application_id, reference));
            }

            let payment = Payment {
                amount_minor: checkout.amount_total.unwrap_or_default(),
                currency: checkout
                    .currency
                    .clone()
                    .unwrap_or_else(|| self.settings.currency.clone()),
                method: PAYMENT_METHOD.to_string(),
                status: PaymentStatus::Completed,
                reference: reference.clone(),
                details: json!({ "checkout_session_id": checkout.id, "event_id": event.id }),
                recorded_at: now,
            };

            match self.record_payment(&record, payment) {
                Ok(updated) => {
                    info!(
                        application_id = %updated.id,
                        reference = %reference,
                        "payment confirmed"
                    );
                    return Ok(WebhookOutcome::Recorded {
                        application_id,
                        reference,
                    });
                }
                Err(RepositoryError::DuplicatePaymentReference(_)) => {
                    return Ok(already_processed(&application_id, reference));
                }
                Err(RepositoryError::VersionMismatch { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(PaymentServiceError::Conflict)
    }

    fn record_payment(
        &self,
        record: &ApplicationRecord,
        payment: Payment,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let target = ApplicationStatus::Accepted;
        if !self.policy.permits(record.status, target) {
            warn!(
                application_id = %record.id,
                from = %record.status,
                "payment confirmed for an application not awaiting payment"
            );
        }

        let change = ApplicationChange {
            status: target,
            steps: vec![TimelineDraft::transition(
                PAYMENT_CONFIRMED_STEP,
                record.status,
                target,
            )],
            payment: Some(payment),
            at: self.clock.utc(),
        };
        self.repository.apply(&record.id, record.version, change)
    }
}

fn already_processed(application_id: &ApplicationId, reference: String) -> WebhookOutcome {
    info!(%application_id, %reference, "duplicate payment confirmation ignored");
    WebhookOutcome::AlreadyProcessed { reference }
}

/// Error raised by the payment service.
#[derive(Debug, thiserror::Error)]
pub enum PaymentServiceError {
    #[error("Application not found")]
    NotFound,
    #[error("application is not awaiting payment (status {0})")]
    NotAwaitingPayment(ApplicationStatus),
    #[error("Webhook signature verification failed: {0}")]
    Signature(#[from] SignatureError),
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
    #[error("application changed concurrently; retry the delivery")]
    Conflict,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for PaymentServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::VersionMismatch { .. } => Self::Conflict,
            other => Self::Repository(other),
        }
    }
}
