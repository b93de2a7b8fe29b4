use crate::cli::ServeArgs;
use crate::infra::{checkout_settings, AppState};
use crate::routes::with_portal_routes;
use admission_portal::config::AppConfig;
use admission_portal::error::AppError;
use admission_portal::telemetry;
use admission_portal::workflows::admission::{AdmissionService, InMemoryAdmissionRepository};
use admission_portal::workflows::assistant::{ChatAssistant, OpenAiCompletionClient};
use admission_portal::workflows::payments::{
    PaymentService, StripeCheckoutGateway, WebhookVerifier,
};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mockable::{Clock, DefaultClock};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    if config.payments.webhook_secret.is_none() {
        warn!("PAYMENTS_WEBHOOK_SECRET unset; payment webhooks will be rejected");
    }
    if config.assistant.api_key.is_none() {
        warn!("ASSISTANT_API_KEY unset; the assistant will answer with a fallback reply");
    }

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(DefaultClock);
    let repository = Arc::new(InMemoryAdmissionRepository::default());
    let admissions = Arc::new(AdmissionService::new(repository.clone(), clock.clone()));
    let payments = Arc::new(PaymentService::new(
        repository.clone(),
        Arc::new(StripeCheckoutGateway::new(
            config.payments.api_base.clone(),
            config.payments.secret_key.clone(),
        )),
        WebhookVerifier::new(config.payments.webhook_secret.clone()),
        clock,
        checkout_settings(&config),
    ));
    let assistant = Arc::new(ChatAssistant::new(
        repository,
        Arc::new(OpenAiCompletionClient::new(
            config.assistant.endpoint.clone(),
            config.assistant.model.clone(),
            config.assistant.api_key.clone(),
        )),
    ));

    let app = with_portal_routes(admissions, payments, assistant)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admission portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
