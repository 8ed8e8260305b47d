// larder/server/src/models/order.rs

use chrono::{DateTime, Utc};
use larder::{AnonymousContact, Order, OrderLine, SessionKey, ShopError, ShopResult};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const ORDER_COLUMNS: &str = "id, order_number, user_id, contact, packaging_fee, coupon_id, coupon_discount, \
   discount_amount, total_price, payment_method, delivery_method, address, address_id, comment, guest_session, \
   status, paid, created_at";

/// `orders` row. Enumerations are stored as their snake_case text form.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub order_number: String,
  pub user_id: Option<Uuid>,
  pub contact: Option<Json<AnonymousContact>>,
  pub packaging_fee: Decimal,
  pub coupon_id: Option<Uuid>,
  pub coupon_discount: Option<Decimal>,
  pub discount_amount: Decimal,
  pub total_price: Decimal,
  pub payment_method: String,
  pub delivery_method: String,
  pub address: Option<String>,
  pub address_id: Option<Uuid>,
  pub comment: Option<String>,
  pub guest_session: Option<String>,
  pub status: String,
  pub paid: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderLineRow {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub price: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLine {
  type Error = ShopError;

  fn try_from(row: OrderLineRow) -> ShopResult<Self> {
    let quantity = u32::try_from(row.quantity)
      .map_err(|_| ShopError::storage(anyhow::anyhow!("order line with negative quantity {}", row.quantity)))?;
    Ok(OrderLine {
      product_id: row.product_id,
      product_name: row.product_name,
      quantity,
      price: row.price,
    })
  }
}

impl OrderRow {
  pub fn into_order(self, lines: Vec<OrderLine>) -> ShopResult<Order> {
    // Unknown enum text means the table was written by something else.
    let id = self.id;
    let storage = |e: ShopError| ShopError::storage(anyhow::anyhow!("corrupt order {}: {}", id, e));
    Ok(Order {
      id,
      payment_method: self.payment_method.parse().map_err(storage)?,
      delivery_method: self.delivery_method.parse().map_err(storage)?,
      status: self.status.parse().map_err(storage)?,
      order_number: self.order_number,
      user_id: self.user_id,
      contact: self.contact.map(|Json(contact)| contact),
      lines,
      packaging_fee: self.packaging_fee,
      coupon_id: self.coupon_id,
      coupon_discount: self.coupon_discount,
      discount_amount: self.discount_amount,
      total_price: self.total_price,
      address: self.address,
      address_id: self.address_id,
      comment: self.comment,
      guest_session: self.guest_session.as_deref().and_then(SessionKey::parse),
      paid: self.paid,
      created_at: self.created_at,
    })
  }
}
