use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hosted checkout the processor should open for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub amount_minor: u64,
    pub currency: String,
    pub product_name: String,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Echoed back verbatim on the completion event.
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("payment processor credentials are not configured")]
    NotConfigured,
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("payment processor unreachable: {0}")]
    Transport(String),
}

/// Outbound side of the payment processor integration.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(&self, request: CheckoutRequest)
        -> Result<CheckoutSession, GatewayError>;
}

/// Checkout sessions over the processor's form-encoded REST API.
pub struct StripeCheckoutGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeCheckoutGateway {
    pub fn new(api_base: impl Into<String>, secret_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key,
        }
    }
}

/// Flattens a request into the bracketed form fields the processor expects.
pub(crate) fn form_fields(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
        (
            "line_items[0][price_data][product_data][description]".to_string(),
            request.description.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.amount_minor.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];
    for (key, value) in &request.metadata {
        fields.push((format!("metadata[{key}]"), value.clone()));
    }
    fields
}

fn processor_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .pointer("/error/message")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutGateway {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let secret_key = self.secret_key.as_deref().ok_or(GatewayError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(secret_key)
            .form(&form_fields(&request))
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = processor_message(&body)
                .unwrap_or_else(|| format!("checkout session request failed with {status}"));
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))
    }
}
