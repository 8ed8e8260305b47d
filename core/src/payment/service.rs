// larder/src/payment/service.rs

use super::gateway::{PaymentGateway, PaymentStart};
use super::webhook::{WebhookEvent, WebhookOutcome, WebhookVerifier, CHECKOUT_COMPLETED};
use crate::error::{ShopError, ShopResult};
use crate::order::{Customer, Order, OrderId, OrderService};
use crate::session::SessionKey;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct PaymentService {
  gateway: Arc<dyn PaymentGateway>,
  orders: OrderService,
  verifier: WebhookVerifier,
}

impl PaymentService {
  pub fn new(gateway: Arc<dyn PaymentGateway>, orders: OrderService, verifier: WebhookVerifier) -> Self {
    Self {
      gateway,
      orders,
      verifier,
    }
  }

  pub fn verifier(&self) -> &WebhookVerifier {
    &self.verifier
  }

  /// Opens a hosted checkout for an order of `customer`.
  pub async fn start_payment(&self, order_id: OrderId, customer: Customer) -> ShopResult<PaymentStart> {
    let order = self.orders.get(order_id, customer).await?;
    self.checkout_session_for(&order).await
  }

  /// Same as `start_payment` for the guest session that placed the order.
  pub async fn start_guest_payment(&self, order_id: OrderId, session: &SessionKey) -> ShopResult<PaymentStart> {
    let order = self.orders.get_for_guest(order_id, session).await?;
    self.checkout_session_for(&order).await
  }

  /// Orders with nothing left to charge are settled here; the providers
  /// refuse zero amounts.
  #[instrument(
    name = "PaymentService::checkout_session_for",
    skip_all,
    fields(order_id = %order.id, gateway = self.gateway.name()),
    err(Display)
  )]
  pub async fn checkout_session_for(&self, order: &Order) -> ShopResult<PaymentStart> {
    if order.paid {
      return Err(ShopError::AlreadyPaid(order.order_number.clone()));
    }
    if !order.payment_method.is_online() {
      return Err(ShopError::Validation(format!(
        "order {} is paid with '{}', not online",
        order.order_number,
        order.payment_method.as_str()
      )));
    }
    if order.total_price.is_zero() {
      let settled = self.orders.store().mark_paid(order.id).await?;
      info!(order_number = %order.order_number, "Nothing to charge, order marked paid.");
      return Ok(PaymentStart::Settled(settled));
    }
    let session = self.gateway.create_checkout_session(order).await?;
    info!(session_id = %session.id, "Checkout session created.");
    Ok(PaymentStart::Redirect(session))
  }

  /// Verifies and applies one webhook delivery. Nothing changes unless the
  /// signature checks out.
  #[instrument(name = "PaymentService::handle_webhook", skip_all, fields(payload_len = payload.len()), err(Display))]
  pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>, now: i64) -> ShopResult<WebhookOutcome> {
    let signature = signature.ok_or_else(|| ShopError::InvalidSignature("missing signature header".into()))?;
    self.verifier.verify(payload, signature, now)?;

    let event = WebhookEvent::parse(payload)?;
    if event.event_type != CHECKOUT_COMPLETED {
      info!(event_type = %event.event_type, "Ignoring webhook event.");
      return Ok(WebhookOutcome::Ignored(event.event_type));
    }
    if let Some(status) = event.data.object.get("payment_status").and_then(Value::as_str) {
      if status != "paid" {
        warn!(payment_status = status, "Checkout completed without payment, ignoring.");
        return Ok(WebhookOutcome::Ignored(format!("{}:{}", event.event_type, status)));
      }
    }

    let order_id = event.order_id()?;
    let order = self.orders.lookup(order_id).await?;
    if order.paid {
      info!(%order_id, "Repeat delivery for a paid order.");
      return Ok(WebhookOutcome::AlreadyPaid(order_id));
    }
    self.orders.store().mark_paid(order_id).await?;
    info!(%order_id, order_number = %order.order_number, "Order marked paid.");
    Ok(WebhookOutcome::Paid(order_id))
  }
}
