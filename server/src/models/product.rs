// larder/server/src/models/product.rs

use larder::Product;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub const PRODUCT_COLUMNS: &str = "id, name, price, discount, amount, unit, times_ordered";

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub discount: Decimal,
  pub amount: i32,
  pub unit: String,
  pub times_ordered: i64,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      price: row.price,
      discount: row.discount,
      amount: row.amount,
      unit: row.unit,
      times_ordered: row.times_ordered,
    }
  }
}
