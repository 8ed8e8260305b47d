// larder/src/order/model.rs

use crate::catalog::ProductId;
use crate::coupon::CouponId;
use crate::error::{ShopError, ShopResult};
use crate::pricing;
use crate::session::SessionKey;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type OrderId = Uuid;
pub type UserId = Uuid;
pub type AddressId = Uuid;

/// Lifecycle of an order. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Ordered,
  Processing,
  Collecting,
  Gathered,
  Delivering,
  Delivered,
  Completed,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 7] = [
    OrderStatus::Ordered,
    OrderStatus::Processing,
    OrderStatus::Collecting,
    OrderStatus::Gathered,
    OrderStatus::Delivering,
    OrderStatus::Delivered,
    OrderStatus::Completed,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Ordered => "ordered",
      OrderStatus::Processing => "processing",
      OrderStatus::Collecting => "collecting",
      OrderStatus::Gathered => "gathered",
      OrderStatus::Delivering => "delivering",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Completed => "completed",
    }
  }

  /// The following status, `None` once completed.
  pub fn next(&self) -> Option<OrderStatus> {
    let idx = Self::ALL.iter().position(|s| s == self)?;
    Self::ALL.get(idx + 1).copied()
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = ShopError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| ShopError::Validation(format!("unknown order status '{s}'")))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  /// Paid online through the hosted checkout.
  Card,
  PickupPointPayment,
  CashOnCourier,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Card => "card",
      PaymentMethod::PickupPointPayment => "pickup_point_payment",
      PaymentMethod::CashOnCourier => "cash_on_courier",
    }
  }

  pub fn is_online(&self) -> bool {
    matches!(self, PaymentMethod::Card)
  }

  pub fn compatible_with(&self, delivery: DeliveryMethod) -> bool {
    !matches!(
      (self, delivery),
      (PaymentMethod::PickupPointPayment, DeliveryMethod::Courier) | (PaymentMethod::CashOnCourier, DeliveryMethod::PickupPoint)
    )
  }
}

impl FromStr for PaymentMethod {
  type Err = ShopError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "card" => Ok(PaymentMethod::Card),
      "pickup_point_payment" => Ok(PaymentMethod::PickupPointPayment),
      "cash_on_courier" => Ok(PaymentMethod::CashOnCourier),
      other => Err(ShopError::Validation(format!("unknown payment method '{other}'"))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
  Courier,
  PickupPoint,
}

impl DeliveryMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      DeliveryMethod::Courier => "courier",
      DeliveryMethod::PickupPoint => "pickup_point",
    }
  }
}

impl FromStr for DeliveryMethod {
  type Err = ShopError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "courier" => Ok(DeliveryMethod::Courier),
      "pickup_point" => Ok(DeliveryMethod::PickupPoint),
      other => Err(ShopError::Validation(format!("unknown delivery method '{other}'"))),
    }
  }
}

/// A saved delivery address of a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
  pub id: AddressId,
  pub user_id: UserId,
  pub address: String,
}

/// Contact details left by a visitor who checks out without an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousContact {
  pub first_name: String,
  pub last_name: String,
  pub phone: String,
  pub email: String,
}

impl AnonymousContact {
  /// Trims every field and checks it is usable for contacting the customer.
  pub fn normalized(&self) -> ShopResult<AnonymousContact> {
    let contact = AnonymousContact {
      first_name: self.first_name.trim().to_string(),
      last_name: self.last_name.trim().to_string(),
      phone: self.phone.trim().to_string(),
      email: self.email.trim().to_string(),
    };

    if contact.first_name.is_empty() || contact.last_name.is_empty() {
      return Err(ShopError::Validation("first and last name are required".into()));
    }
    let digits = contact.phone.chars().filter(char::is_ascii_digit).count();
    let phone_ok = contact
      .phone
      .chars()
      .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if !phone_ok || !(7..=15).contains(&digits) {
      return Err(ShopError::Validation(format!("invalid phone number '{}'", contact.phone)));
    }
    match contact.email.split_once('@') {
      Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') => {}
      _ => return Err(ShopError::Validation(format!("invalid email '{}'", contact.email))),
    }
    Ok(contact)
  }
}

/// Who is acting on a cart or an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Customer {
  User(UserId),
  Anonymous,
}

impl Customer {
  pub fn user_id(&self) -> Option<UserId> {
    match self {
      Customer::User(id) => Some(*id),
      Customer::Anonymous => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
  pub product_id: ProductId,
  pub product_name: String,
  pub quantity: u32,
  /// Final unit price at order time.
  pub price: Decimal,
}

impl OrderLine {
  pub fn total_price(&self) -> Decimal {
    pricing::line_total(self.quantity, self.price)
  }
}

/// Everything needed to persist an order; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
  pub order_number: String,
  pub user_id: Option<UserId>,
  pub contact: Option<AnonymousContact>,
  pub lines: Vec<OrderLine>,
  pub packaging_fee: Decimal,
  pub coupon_id: Option<CouponId>,
  pub coupon_discount: Option<Decimal>,
  pub discount_amount: Decimal,
  pub total_price: Decimal,
  pub payment_method: PaymentMethod,
  pub delivery_method: DeliveryMethod,
  pub address: Option<String>,
  pub address_id: Option<AddressId>,
  pub comment: Option<String>,
  /// Session that placed an anonymous order.
  pub guest_session: Option<SessionKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: OrderId,
  pub order_number: String,
  pub user_id: Option<UserId>,
  pub contact: Option<AnonymousContact>,
  pub lines: Vec<OrderLine>,
  pub packaging_fee: Decimal,
  pub coupon_id: Option<CouponId>,
  pub coupon_discount: Option<Decimal>,
  pub discount_amount: Decimal,
  pub total_price: Decimal,
  pub payment_method: PaymentMethod,
  pub delivery_method: DeliveryMethod,
  pub address: Option<String>,
  pub address_id: Option<AddressId>,
  pub comment: Option<String>,
  /// Lets the guest who placed the order retry its payment. Never serialized.
  #[serde(skip)]
  pub guest_session: Option<SessionKey>,
  pub status: OrderStatus,
  pub paid: bool,
  pub created_at: DateTime<Utc>,
}

impl Order {
  /// A freshly committed order: status `ordered`, unpaid.
  pub fn from_new(new: NewOrder, id: OrderId, created_at: DateTime<Utc>) -> Self {
    Order {
      id,
      order_number: new.order_number,
      user_id: new.user_id,
      contact: new.contact,
      lines: new.lines,
      packaging_fee: new.packaging_fee,
      coupon_id: new.coupon_id,
      coupon_discount: new.coupon_discount,
      discount_amount: new.discount_amount,
      total_price: new.total_price,
      payment_method: new.payment_method,
      delivery_method: new.delivery_method,
      address: new.address,
      address_id: new.address_id,
      comment: new.comment,
      guest_session: new.guest_session,
      status: OrderStatus::Ordered,
      paid: false,
      created_at,
    }
  }

  pub fn is_anonymous(&self) -> bool {
    self.user_id.is_none()
  }

  /// True for an anonymous order placed from `session`.
  pub fn placed_by_guest(&self, session: &SessionKey) -> bool {
    self.is_anonymous() && self.guest_session.as_ref() == Some(session)
  }

  pub fn total_quantity(&self) -> u64 {
    self.lines.iter().map(|l| u64::from(l.quantity)).sum()
  }
}
