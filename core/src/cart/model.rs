// larder/src/cart/model.rs

use crate::catalog::{Product, ProductId};
use crate::coupon::{Coupon, CouponId};
use crate::error::{ShopError, ShopResult};
use crate::pricing;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product in a cart, with the display fields and final price captured when it was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: ProductId,
  pub quantity: u32,
  pub name: String,
  pub unit: String,
  pub price: Decimal,
  pub added_at: DateTime<Utc>,
}

/// A cart line as presented to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineView {
  pub product_id: ProductId,
  pub name: String,
  pub unit: String,
  pub quantity: u32,
  pub price: Decimal,
  pub total_price: Decimal,
  pub added_at: DateTime<Utc>,
}

impl From<&CartLine> for CartLineView {
  fn from(line: &CartLine) -> Self {
    CartLineView {
      product_id: line.product_id,
      name: line.name.clone(),
      unit: line.unit.clone(),
      quantity: line.quantity,
      price: line.price,
      total_price: pricing::line_total(line.quantity, line.price),
      added_at: line.added_at,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedCoupon {
  pub code: String,
  pub discount: Decimal,
}

/// Cart contents plus totals. `discount_amount` is informational: the cart
/// total is not reduced by it; the discount is applied when the order is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
  pub lines: Vec<CartLineView>,
  pub total_quantity: u64,
  pub total_price: Decimal,
  pub coupon: Option<AppliedCoupon>,
  pub discount_amount: Decimal,
  pub total_after_discount: Decimal,
}

/// Cart state of one session.
///
/// Holds at most one line per product; no line ever has a quantity of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
  #[serde(default)]
  lines: Vec<CartLine>,
  #[serde(default)]
  coupon_id: Option<CouponId>,
}

impl Cart {
  /// Converts a client-supplied quantity, rejecting anything below 1.
  pub fn checked_quantity(quantity: i64) -> ShopResult<u32> {
    u32::try_from(quantity)
      .ok()
      .filter(|q| *q >= 1)
      .ok_or(ShopError::InvalidQuantity(quantity))
  }

  /// Puts `product` in the cart with exactly `quantity` units.
  ///
  /// An existing line keeps its position and insertion time; its quantity is
  /// replaced and its price snapshot refreshed.
  pub fn set_line(&mut self, product: &Product, quantity: u32, now: DateTime<Utc>) -> ShopResult<()> {
    if quantity == 0 {
      return Err(ShopError::InvalidQuantity(0));
    }
    let price = product.final_price();
    match self.lines.iter_mut().find(|l| l.product_id == product.id) {
      Some(line) => {
        line.quantity = quantity;
        line.name.clone_from(&product.name);
        line.unit.clone_from(&product.unit);
        line.price = price;
      }
      None => self.lines.push(CartLine {
        product_id: product.id,
        quantity,
        name: product.name.clone(),
        unit: product.unit.clone(),
        price,
        added_at: now,
      }),
    }
    Ok(())
  }

  /// Changes the quantity of an existing line; zero removes it.
  pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> ShopResult<()> {
    if quantity == 0 {
      return self.remove(product_id).map(|_| ());
    }
    let line = self
      .lines
      .iter_mut()
      .find(|l| l.product_id == product_id)
      .ok_or_else(|| ShopError::not_found("Cart line", product_id))?;
    line.quantity = quantity;
    Ok(())
  }

  /// Removes a line. An emptied cart also loses its coupon.
  pub fn remove(&mut self, product_id: ProductId) -> ShopResult<CartLine> {
    let idx = self
      .lines
      .iter()
      .position(|l| l.product_id == product_id)
      .ok_or_else(|| ShopError::not_found("Cart line", product_id))?;
    let removed = self.lines.remove(idx);
    if self.lines.is_empty() {
      self.coupon_id = None;
    }
    Ok(removed)
  }

  pub fn clear(&mut self) {
    self.lines.clear();
    self.coupon_id = None;
  }

  pub fn get(&self, product_id: ProductId) -> Option<&CartLine> {
    self.lines.iter().find(|l| l.product_id == product_id)
  }

  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  /// Line views in insertion order. Every call starts afresh and recomputes line totals.
  pub fn list(&self) -> impl Iterator<Item = CartLineView> + '_ {
    self.lines.iter().map(CartLineView::from)
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn total_quantity(&self) -> u64 {
    self.lines.iter().map(|l| u64::from(l.quantity)).sum()
  }

  pub fn total_price(&self) -> Decimal {
    pricing::sum_lines(self.lines.iter().map(|l| pricing::line_total(l.quantity, l.price)))
  }

  pub fn coupon_id(&self) -> Option<CouponId> {
    self.coupon_id
  }

  pub fn attach_coupon(&mut self, coupon: &Coupon) {
    self.coupon_id = Some(coupon.id);
  }

  pub fn detach_coupon(&mut self) {
    self.coupon_id = None;
  }

  /// Builds the client-facing summary given the (already revalidated) attached coupon.
  pub fn summary(&self, coupon: Option<&Coupon>) -> CartSummary {
    let total_price = self.total_price();
    let discount_amount = coupon.map_or(Decimal::ZERO, |c| c.discount_amount(total_price));
    CartSummary {
      lines: self.list().collect(),
      total_quantity: self.total_quantity(),
      total_price,
      coupon: coupon.map(|c| AppliedCoupon {
        code: c.code.clone(),
        discount: c.discount,
      }),
      discount_amount,
      total_after_discount: total_price - discount_amount,
    }
  }

  pub fn to_bytes(&self) -> ShopResult<Vec<u8>> {
    Ok(serde_json::to_vec(self)?)
  }

  pub fn from_bytes(bytes: &[u8]) -> ShopResult<Self> {
    Ok(serde_json::from_slice(bytes)?)
  }
}
