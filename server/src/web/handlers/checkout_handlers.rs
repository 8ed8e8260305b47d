// larder/server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use larder::{CheckoutForm, PaymentStart};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{CartSession, MaybeUser};

/// Places an order from the session cart. Card orders also get a hosted
/// payment page unless their total is zero; if the provider fails the order
/// still stands and the response carries the error instead of a URL.
#[instrument(
  name = "handler::checkout",
  skip(app_state, session, form),
  fields(customer = ?customer.0, payment = form.payment_method.as_str(), delivery = form.delivery_method.as_str())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  session: CartSession,
  customer: MaybeUser,
  form: web::Json<CheckoutForm>,
) -> Result<HttpResponse, AppError> {
  let mut order = app_state.builder.build(&session.key, customer.0, form.into_inner()).await?;
  info!(order_id = %order.id, order_number = %order.order_number, "Checkout completed.");

  let mut payment_url = None;
  let mut payment_error = None;
  if order.payment_method.is_online() {
    let started = app_state.payments.checkout_session_for(&order).await;
    match started {
      Ok(PaymentStart::Redirect(checkout)) => payment_url = Some(checkout.url),
      Ok(PaymentStart::Settled(settled)) => order = settled,
      Err(e) => {
        error!(order_id = %order.id, error = %e, "Order placed but the payment session could not be created.");
        payment_error = Some("Payment provider unavailable, retry payment later.");
      }
    }
  }

  session.attach(HttpResponse::Created().json(json!({
      "order": order,
      "payment_url": payment_url,
      "payment_error": payment_error
  })))
}
