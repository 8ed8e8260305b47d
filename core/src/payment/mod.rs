// larder/src/payment/mod.rs

//! Hosted checkout and the signed completion webhook.

pub mod gateway;
pub mod service;
pub mod webhook;

pub use gateway::{CheckoutSession, PaymentGateway, PaymentStart};
pub use service::PaymentService;
pub use webhook::{WebhookEvent, WebhookOutcome, WebhookVerifier, CHECKOUT_COMPLETED};
