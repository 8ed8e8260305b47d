// larder/src/coupon.rs

//! Time-windowed percentage coupons.

use crate::error::{ShopError, ShopResult};
use crate::pricing;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub type CouponId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
  pub id: CouponId,
  pub code: String,
  /// Discount in percent, 0..=100.
  pub discount: Decimal,
  pub active: bool,
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
}

impl Coupon {
  /// Active, discount within 0..=100, and `now` inside `[start_time, end_time]`;
  /// a missing bound is open.
  pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
    self.active
      && pricing::is_valid_percentage(self.discount)
      && self.start_time.map_or(true, |start| start <= now)
      && self.end_time.map_or(true, |end| end >= now)
  }

  pub fn discount_amount(&self, total: Decimal) -> Decimal {
    pricing::percentage_of(total, self.discount)
  }
}

#[async_trait]
pub trait CouponStore: Send + Sync {
  /// Case-insensitive lookup by code. Returns every candidate; validity is decided by the caller.
  async fn find_by_code(&self, code: &str) -> ShopResult<Vec<Coupon>>;

  async fn find_coupon(&self, id: CouponId) -> ShopResult<Option<Coupon>>;
}

/// Turns a code typed by a customer into a coupon that may be attached to a cart.
#[derive(Clone)]
pub struct CouponResolver {
  store: Arc<dyn CouponStore>,
}

impl CouponResolver {
  pub fn new(store: Arc<dyn CouponStore>) -> Self {
    Self { store }
  }

  /// Finds an active coupon for `code` that is valid at `now`.
  #[instrument(name = "CouponResolver::resolve", skip(self))]
  pub async fn resolve(&self, code: &str, now: DateTime<Utc>) -> ShopResult<Coupon> {
    let code = code.trim();
    if code.is_empty() {
      return Err(ShopError::InvalidCoupon(String::new()));
    }

    let candidates = self.store.find_by_code(code).await?;
    match candidates.into_iter().find(|c| c.is_valid_at(now)) {
      Some(coupon) => {
        info!(coupon_id = %coupon.id, discount = %coupon.discount, "Coupon resolved.");
        Ok(coupon)
      }
      None => {
        warn!("No active coupon matches the code.");
        Err(ShopError::InvalidCoupon(code.to_string()))
      }
    }
  }

  /// Re-reads an attached coupon, dropping it when it has expired or been disabled since.
  pub async fn revalidate(&self, id: CouponId, now: DateTime<Utc>) -> ShopResult<Option<Coupon>> {
    let coupon = self.store.find_coupon(id).await?;
    Ok(coupon.filter(|c| c.is_valid_at(now)))
  }

  /// Informational discount for a cart total; zero without a coupon.
  pub fn discount_amount(coupon: Option<&Coupon>, cart_total: Decimal) -> Decimal {
    coupon.map_or(Decimal::ZERO, |c| c.discount_amount(cart_total))
  }
}
