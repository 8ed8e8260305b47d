// larder/server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use larder::{Customer, PaymentStart};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, CartSession, MaybeUser};

#[instrument(name = "handler::list_orders", skip(app_state), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_for_user(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .get(path.into_inner(), Customer::User(auth_user.user_id))
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(name = "handler::delete_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  app_state.orders.delete(path.into_inner(), auth_user.user_id).await?;
  Ok(HttpResponse::NoContent().finish())
}

/// Starts (or restarts) the payment of an order. Signed-in users pay their
/// own orders; guests pay from the session that placed the order.
#[instrument(name = "handler::pay_order", skip(app_state, session), fields(customer = ?customer.0))]
pub async fn pay_order_handler(
  app_state: web::Data<AppState>,
  customer: MaybeUser,
  session: CartSession,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let started = match customer.0 {
    Customer::User(_) => app_state.payments.start_payment(order_id, customer.0).await?,
    Customer::Anonymous => app_state.payments.start_guest_payment(order_id, &session.key).await?,
  };
  let body = match &started {
    PaymentStart::Redirect(checkout) => {
      info!(session_id = %checkout.id, "Payment session issued.");
      json!({ "session_id": checkout.id, "payment_url": checkout.url, "paid": false })
    }
    PaymentStart::Settled(order) => json!({ "session_id": null, "payment_url": null, "paid": order.paid }),
  };
  Ok(HttpResponse::Ok().json(body))
}
