// larder/src/checkout/context.rs

use super::form::CheckoutForm;
use crate::cart::Cart;
use crate::coupon::Coupon;
use crate::order::{AddressId, AnonymousContact, Customer, Order, OrderLine};
use crate::session::SessionKey;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Lines and money of an order before it has a number.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
  pub lines: Vec<OrderLine>,
  pub subtotal: Decimal,
  pub packaging_fee: Decimal,
  pub coupon: Option<Coupon>,
  pub discount_amount: Decimal,
  pub total_price: Decimal,
}

/// Data threaded through the checkout pipeline. Each step fills in one more field.
#[derive(Debug, Clone)]
pub struct CheckoutState {
  pub session: SessionKey,
  pub customer: Customer,
  pub form: CheckoutForm,
  pub now: DateTime<Utc>,

  // load_cart
  pub cart: Option<Cart>,
  // resolve_recipient
  pub address: Option<String>,
  pub address_id: Option<AddressId>,
  pub contact: Option<AnonymousContact>,
  // price_lines
  pub priced: Option<PricedOrder>,
  // commit_order
  pub order: Option<Order>,
  pub cart_cleared: bool,
}

impl CheckoutState {
  pub fn new(session: SessionKey, customer: Customer, form: CheckoutForm, now: DateTime<Utc>) -> Self {
    Self {
      session,
      customer,
      form,
      now,
      cart: None,
      address: None,
      address_id: None,
      contact: None,
      priced: None,
      order: None,
      cart_cleared: false,
    }
  }
}
