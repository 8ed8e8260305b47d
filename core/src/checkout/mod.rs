// larder/src/checkout/mod.rs

//! Turns a session cart plus a checkout form into a persisted order.

pub mod builder;
pub mod context;
pub mod form;

pub use builder::OrderBuilder;
pub use context::{CheckoutState, PricedOrder};
pub use form::{CheckoutForm, DeliveryDetails};
