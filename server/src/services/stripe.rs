// larder/server/src/services/stripe.rs

use async_trait::async_trait;
use larder::{CheckoutSession, Order, PaymentGateway, ShopError, ShopResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SessionResponse {
  id: String,
  url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<String>,
  #[serde(rename = "type", default)]
  kind: Option<String>,
}

/// Stripe Checkout over its REST API.
#[derive(Clone)]
pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
  currency: String,
  app_base_url: String,
}

impl StripeGateway {
  pub fn new(
    secret_key: impl Into<String>,
    api_base: impl Into<String>,
    currency: impl Into<String>,
    app_base_url: impl Into<String>,
  ) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self {
      client,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
      currency: currency.into(),
      app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
    })
  }

  /// Form fields of a one-line checkout session charging the order total.
  fn session_form(&self, order: &Order) -> ShopResult<Vec<(String, String)>> {
    let cents = to_minor_units(order.total_price)?;
    let order_id = order.id.to_string();
    Ok(vec![
      ("mode".into(), "payment".into()),
      ("client_reference_id".into(), order_id.clone()),
      ("metadata[order_id]".into(), order_id.clone()),
      ("metadata[order_number]".into(), order.order_number.clone()),
      ("success_url".into(), format!("{}/orders/{}?paid=1", self.app_base_url, order_id)),
      ("cancel_url".into(), format!("{}/orders/{}", self.app_base_url, order_id)),
      ("line_items[0][quantity]".into(), "1".into()),
      ("line_items[0][price_data][currency]".into(), self.currency.clone()),
      ("line_items[0][price_data][unit_amount]".into(), cents.to_string()),
      (
        "line_items[0][price_data][product_data][name]".into(),
        format!("Order {}", order.order_number),
      ),
    ])
  }
}

fn to_minor_units(amount: Decimal) -> ShopResult<i64> {
  (amount * Decimal::ONE_HUNDRED)
    .round()
    .to_i64()
    .filter(|cents| *cents > 0)
    .ok_or_else(|| ShopError::gateway(anyhow::anyhow!("cannot charge an amount of {amount}")))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  fn name(&self) -> &'static str {
    "stripe"
  }

  #[instrument(name = "StripeGateway::create_checkout_session", skip_all, fields(order_id = %order.id))]
  async fn create_checkout_session(&self, order: &Order) -> ShopResult<CheckoutSession> {
    let form = self.session_form(order)?;
    let response = self
      .client
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .bearer_auth(&self.secret_key)
      .form(&form)
      .send()
      .await
      .map_err(ShopError::gateway)?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .map(|e| format!("{}: {}", e.error.kind.unwrap_or_default(), e.error.message.unwrap_or_default()))
        .unwrap_or(body);
      error!(%status, %detail, "Stripe refused the checkout session.");
      return Err(ShopError::gateway(anyhow::anyhow!("stripe returned {status}: {detail}")));
    }

    let session: SessionResponse = response.json().await.map_err(ShopError::gateway)?;
    let url = session
      .url
      .ok_or_else(|| ShopError::gateway(anyhow::anyhow!("checkout session {} has no url", session.id)))?;
    info!(session_id = %session.id, "Stripe checkout session created.");
    Ok(CheckoutSession { id: session.id, url })
  }
}

impl std::fmt::Debug for StripeGateway {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StripeGateway")
      .field("api_base", &self.api_base)
      .field("currency", &self.currency)
      .finish_non_exhaustive()
  }
}
