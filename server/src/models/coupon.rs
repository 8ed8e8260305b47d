// larder/server/src/models/coupon.rs

use chrono::{DateTime, Utc};
use larder::Coupon;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub const COUPON_COLUMNS: &str = "id, code, discount, active, start_time, end_time";

#[derive(Debug, Clone, FromRow)]
pub struct CouponRow {
  pub id: Uuid,
  pub code: String,
  pub discount: Decimal,
  pub active: bool,
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
}

impl From<CouponRow> for Coupon {
  fn from(row: CouponRow) -> Self {
    Coupon {
      id: row.id,
      code: row.code,
      discount: row.discount,
      active: row.active,
      start_time: row.start_time,
      end_time: row.end_time,
    }
  }
}
