//! Enrollment fee checkout and processor confirmation.

pub mod checkout;
pub mod router;
pub mod service;
pub mod signature;
pub mod webhook;


pub use checkout::{
    CheckoutGateway, CheckoutRequest, CheckoutSession, GatewayError, StripeCheckoutGateway,
};
pub use router::payment_router;
pub use service::{
    CheckoutSettings, CheckoutStarted, PaymentService, PaymentServiceError, WebhookOutcome,
};
pub use signature::{signature_header, SignatureError, WebhookVerifier, SIGNATURE_HEADER};
pub use webhook::{CompletedCheckout, ProcessorEvent, CHECKOUT_COMPLETED};
