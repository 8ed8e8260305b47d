// larder/src/catalog.rs

//! Products as the cart and the order builder see them.

use crate::error::{ShopError, ShopResult};
use crate::pricing;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProductId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  pub price: Decimal,
  /// Standing promotional discount in percent.
  pub discount: Decimal,
  pub amount: i32,
  pub unit: String,
  pub times_ordered: i64,
}

impl Product {
  /// Price after the promotional discount, before any coupon.
  pub fn final_price(&self) -> Decimal {
    pricing::discounted_price(self.price, self.effective_discount())
  }

  /// The promotional discount, or zero when it lies outside 0..=100.
  pub fn effective_discount(&self) -> Decimal {
    if pricing::is_valid_percentage(self.discount) {
      self.discount
    } else {
      Decimal::ZERO
    }
  }

  pub fn in_stock(&self) -> bool {
    self.amount > 0
  }
}

/// Read access to the product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Returns `Ok(None)` for an unknown id; errors are reserved for storage failures.
  async fn find_product(&self, id: ProductId) -> ShopResult<Option<Product>>;

  async fn list_products(&self) -> ShopResult<Vec<Product>>;

  async fn get_product(&self, id: ProductId) -> ShopResult<Product> {
    self
      .find_product(id)
      .await?
      .ok_or_else(|| ShopError::not_found("Product", id))
  }
}
