// larder/server/src/services/payment_mock.rs

use async_trait::async_trait;
use larder::{CheckoutSession, Order, PaymentGateway, ShopError, ShopResult};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Local stand-in for the hosted checkout. Sessions point back at the app
/// itself; completion is simulated by posting a signed webhook.
#[derive(Debug, Clone)]
pub struct MockGateway {
  base_url: String,
  latency: Duration,
}

impl MockGateway {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      latency: Duration::from_millis(50),
    }
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  fn name(&self) -> &'static str {
    "mock"
  }

  #[instrument(name = "MockGateway::create_checkout_session", skip_all, fields(order_id = %order.id, total = %order.total_price))]
  async fn create_checkout_session(&self, order: &Order) -> ShopResult<CheckoutSession> {
    if order.total_price <= Decimal::ZERO {
      return Err(ShopError::gateway(anyhow::anyhow!("amount must be greater than zero")));
    }
    tokio::time::sleep(self.latency).await; // Simulate network latency

    let id = format!("mock_cs_{}", Uuid::new_v4().simple());
    info!(session_id = %id, "Simulated checkout session created.");
    Ok(CheckoutSession {
      url: format!("{}/mock-checkout/{}?order={}", self.base_url.trim_end_matches('/'), id, order.id),
      id,
    })
  }
}
