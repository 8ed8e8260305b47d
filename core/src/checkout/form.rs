// larder/src/checkout/form.rs

use crate::order::{AddressId, AnonymousContact, DeliveryMethod, PaymentMethod};
use serde::{Deserialize, Serialize};

/// Where a courier should go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryDetails {
  #[default]
  None,
  /// A saved address of the signed-in user.
  Saved { address_id: AddressId },
  /// A free-text address.
  Text { address: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutForm {
  pub payment_method: PaymentMethod,
  pub delivery_method: DeliveryMethod,
  #[serde(default)]
  pub delivery: DeliveryDetails,
  /// Adds the flat packaging fee.
  #[serde(default)]
  pub packaging: bool,
  #[serde(default)]
  pub comment: Option<String>,
  /// Required when checking out without an account.
  #[serde(default)]
  pub contact: Option<AnonymousContact>,
}

impl CheckoutForm {
  pub fn new(payment_method: PaymentMethod, delivery_method: DeliveryMethod) -> Self {
    Self {
      payment_method,
      delivery_method,
      delivery: DeliveryDetails::None,
      packaging: false,
      comment: None,
      contact: None,
    }
  }

  pub fn with_delivery(mut self, delivery: DeliveryDetails) -> Self {
    self.delivery = delivery;
    self
  }

  pub fn with_packaging(mut self, packaging: bool) -> Self {
    self.packaging = packaging;
    self
  }

  pub fn with_contact(mut self, contact: AnonymousContact) -> Self {
    self.contact = Some(contact);
    self
  }
}
