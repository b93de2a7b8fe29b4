use admission_portal::config::AppConfig;
use admission_portal::workflows::payments::CheckoutSettings;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn checkout_settings(config: &AppConfig) -> CheckoutSettings {
    CheckoutSettings {
        enrollment_fee_minor: config.payments.enrollment_fee_minor,
        currency: config.payments.currency.clone(),
        public_url: config.server.public_url.trim_end_matches('/').to_string(),
    }
}
