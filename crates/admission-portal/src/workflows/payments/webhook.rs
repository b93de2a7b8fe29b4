use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Metadata key set at checkout creation to correlate the event with an application.
pub const APPLICATION_ID_METADATA: &str = "application_id";
pub const USER_EMAIL_METADATA: &str = "user_email";

/// Envelope of a processor notification.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

/// Fields of a completed checkout session the portal relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedCheckout {
    pub id: String,
    #[serde(default)]
    payment_intent: Option<Value>,
    #[serde(default)]
    pub amount_total: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CompletedCheckout {
    /// The payment intent id (plain or expanded), else the session id.
    pub fn reference(&self) -> String {
        let intent = match &self.payment_intent {
            Some(Value::String(id)) => Some(id.as_str()),
            Some(Value::Object(expanded)) => expanded.get("id").and_then(Value::as_str),
            _ => None,
        };
        intent
            .filter(|id| !id.is_empty())
            .unwrap_or(self.id.as_str())
            .to_string()
    }

    pub fn application_id(&self) -> Option<&str> {
        self.metadata
            .get(APPLICATION_ID_METADATA)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

impl ProcessorEvent {
    pub fn completed_checkout(&self) -> Result<Option<CompletedCheckout>, serde_json::Error> {
        if self.kind != CHECKOUT_COMPLETED {
            return Ok(None);
        }
        serde_json::from_value(self.data.object.clone()).map(Some)
    }
}
