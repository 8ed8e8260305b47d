// larder/src/payment/gateway.rs

use crate::error::ShopResult;
use crate::order::Order;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A hosted payment page created for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
  pub id: String,
  /// Where the customer is redirected to pay.
  pub url: String,
}

/// How a payment attempt for an order ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentStart {
  /// The customer pays on the hosted page.
  Redirect(CheckoutSession),
  /// Nothing to charge. The order was marked paid without the provider.
  Settled(Order),
}

impl PaymentStart {
  pub fn payment_url(&self) -> Option<&str> {
    match self {
      PaymentStart::Redirect(session) => Some(session.url.as_str()),
      PaymentStart::Settled(_) => None,
    }
  }
}

/// The payment provider.
///
/// Implementations report provider failures as `ShopError::Gateway`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn name(&self) -> &'static str;

  async fn create_checkout_session(&self, order: &Order) -> ShopResult<CheckoutSession>;
}
