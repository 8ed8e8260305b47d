// larder/server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use larder::ShopError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Shop(#[from] ShopError),

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<ShopError>() {
      Ok(shop) => AppError::Shop(shop),
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(db) => AppError::Sqlx(db),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl AppError {
  /// Stable machine-readable error code.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Shop(e) => match e {
        ShopError::NotFound { .. } => "not_found",
        ShopError::EmptyCart => "empty_cart",
        ShopError::InvalidCoupon(_) => "invalid_coupon",
        ShopError::InvalidQuantity(_) => "invalid_quantity",
        ShopError::IncompatiblePaymentDelivery { .. } => "incompatible_payment_delivery",
        ShopError::MissingAddress => "missing_address",
        ShopError::PermissionDenied(_) => "permission_denied",
        ShopError::Gateway { .. } => "gateway_error",
        ShopError::AlreadyPaid(_) => "already_paid",
        ShopError::RestrictedStatusTransition { .. } => "restricted_status_transition",
        ShopError::Validation(_) => "validation",
        ShopError::InvalidSignature(_) => "invalid_signature",
        ShopError::DuplicateOrderNumber(_)
        | ShopError::Storage { .. }
        | ShopError::Serialization(_)
        | ShopError::Pipeline(_) => "internal",
      },
      AppError::Validation(_) => "validation",
      AppError::Auth(_) => "unauthorized",
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => "internal",
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Shop(e) => match e {
        ShopError::NotFound { .. } => StatusCode::NOT_FOUND,
        ShopError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        ShopError::AlreadyPaid(_) | ShopError::RestrictedStatusTransition { .. } => StatusCode::CONFLICT,
        ShopError::Gateway { .. } => StatusCode::BAD_GATEWAY,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      // Full detail goes to the log only.
      tracing::error!(application_error = %self, kind = self.kind(), "Responding with server error");
      let message = match self {
        AppError::Shop(ShopError::Gateway { .. }) => "Payment provider error",
        AppError::Sqlx(_) | AppError::Shop(ShopError::Storage { .. }) => "Database operation failed",
        AppError::Config(_) => "Configuration issue",
        _ => "An internal error occurred",
      };
      return HttpResponse::build(status).json(json!({"error": message, "kind": self.kind()}));
    }
    tracing::warn!(application_error = %self, kind = self.kind(), "Responding with client error");
    HttpResponse::build(status).json(json!({"error": self.to_string(), "kind": self.kind()}))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
