// larder/server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CartSession;

#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  pub quantity: i64,
}

#[derive(Deserialize, Debug)]
pub struct UpdateQuantityPayload {
  pub quantity: i64,
}

#[derive(Deserialize, Debug)]
pub struct ApplyCouponPayload {
  pub code: String,
}

async fn summary_response(app_state: &AppState, session: &CartSession) -> Result<HttpResponse, AppError> {
  let summary = app_state.carts.summary(&session.key, Utc::now()).await?;
  session.attach(HttpResponse::Ok().json(json!({ "cart": summary })))
}

#[instrument(name = "handler::get_cart", skip_all)]
pub async fn get_cart_handler(app_state: web::Data<AppState>, session: CartSession) -> Result<HttpResponse, AppError> {
  summary_response(&app_state, &session).await
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, session, payload),
  fields(product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  session: CartSession,
  payload: web::Json<AddToCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  app_state
    .carts
    .add(&session.key, payload.product_id, payload.quantity)
    .await?;
  info!("Cart line set.");
  summary_response(&app_state, &session).await
}

#[instrument(name = "handler::update_cart_item", skip(app_state, session, payload), fields(quantity = payload.quantity))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  session: CartSession,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateQuantityPayload>,
) -> Result<HttpResponse, AppError> {
  app_state
    .carts
    .update(&session.key, path.into_inner(), payload.quantity)
    .await?;
  summary_response(&app_state, &session).await
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, session))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  session: CartSession,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  app_state.carts.remove(&session.key, path.into_inner()).await?;
  summary_response(&app_state, &session).await
}

#[instrument(name = "handler::clear_cart", skip_all)]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, session: CartSession) -> Result<HttpResponse, AppError> {
  app_state.carts.clear(&session.key).await?;
  session.attach(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::apply_coupon", skip(app_state, session))]
pub async fn apply_coupon_handler(
  app_state: web::Data<AppState>,
  session: CartSession,
  payload: web::Json<ApplyCouponPayload>,
) -> Result<HttpResponse, AppError> {
  let now = Utc::now();
  let coupon = app_state.carts.apply_coupon(&session.key, &payload.code, now).await?;
  let summary = app_state.carts.summary(&session.key, now).await?;
  session.attach(HttpResponse::Ok().json(json!({
      "coupon": { "code": coupon.code, "discount": coupon.discount },
      "cart": summary
  })))
}

#[instrument(name = "handler::remove_coupon", skip_all)]
pub async fn remove_coupon_handler(
  app_state: web::Data<AppState>,
  session: CartSession,
) -> Result<HttpResponse, AppError> {
  app_state.carts.remove_coupon(&session.key).await?;
  summary_response(&app_state, &session).await
}
