// larder/server/src/services/mod.rs

//! Payment providers behind `larder::PaymentGateway`.

pub mod payment_mock;
pub mod stripe;

pub use payment_mock::MockGateway;
pub use stripe::StripeGateway;
