// larder/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the step runner itself, independent of any domain.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Handler missing for non-optional step: {step_name}")]
    HandlerMissing { step_name: String },

    #[error("Step '{step_name}' left the context without '{field}'")]
    MissingState { step_name: String, field: &'static str },
}

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Coupon '{0}' is not valid")]
    InvalidCoupon(String),

    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("Payment method '{payment}' cannot be combined with delivery method '{delivery}'")]
    IncompatiblePaymentDelivery { payment: String, delivery: String },

    #[error("Courier delivery requires a delivery address")]
    MissingAddress,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Payment gateway error: {source}")]
    Gateway {
        #[source]
        source: AnyhowError,
    },

    #[error("Order {0} is already paid")]
    AlreadyPaid(String),

    #[error("Order in status '{status}' cannot be {action}")]
    RestrictedStatusTransition { status: String, action: &'static str },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Webhook signature rejected: {0}")]
    InvalidSignature(String),

    #[error("Order number '{0}' is already taken")]
    DuplicateOrderNumber(String),

    #[error("Storage error: {source}")]
    Storage {
        #[source]
        source: AnyhowError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl ShopError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ShopError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wraps a failure of the persistence layer.
    pub fn storage(err: impl Into<AnyhowError>) -> Self {
        ShopError::Storage { source: err.into() }
    }

    /// Wraps a failure reported by the payment provider.
    pub fn gateway(err: impl Into<AnyhowError>) -> Self {
        ShopError::Gateway { source: err.into() }
    }

    /// True for errors caused by the client's input rather than by us or a third party.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ShopError::Gateway { .. }
                | ShopError::Storage { .. }
                | ShopError::Serialization(_)
                | ShopError::Pipeline(_)
                | ShopError::DuplicateOrderNumber(_)
        )
    }
}

pub type ShopResult<T, E = ShopError> = std::result::Result<T, E>;
