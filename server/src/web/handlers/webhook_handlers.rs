// larder/server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use larder::WebhookOutcome;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Payment provider callback. A bad signature is answered with 400 and
/// leaves every order untouched; anything verified is acknowledged.
#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(payload_len = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature = req.headers().get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());

  let outcome = app_state
    .payments
    .handle_webhook(&body, signature, Utc::now().timestamp())
    .await?;

  let (status, order_id) = match &outcome {
    WebhookOutcome::Paid(id) => ("paid", Some(*id)),
    WebhookOutcome::AlreadyPaid(id) => ("already_paid", Some(*id)),
    WebhookOutcome::Ignored(_) => ("ignored", None),
  };
  info!(status, ?order_id, "Webhook processed.");
  Ok(HttpResponse::Ok().json(json!({ "received": true, "status": status, "order_id": order_id })))
}
