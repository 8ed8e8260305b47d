// src/lib.rs

//! Larder: the cart and checkout core of a food store backend.
//!
//! The crate owns the business rules between "a visitor puts a product in a
//! basket" and "a paid order exists":
//!  - A session-scoped cart with replace-not-increment quantities.
//!  - Time-windowed percentage coupons resolved case-insensitively.
//!  - Exact decimal pricing rounded to cents.
//!  - An order builder that runs as a named-step pipeline and persists the
//!    order atomically through an injected store.
//!  - A hosted-checkout payment gateway contract and signed webhook handling.
//!
//! Persistence (catalog, sessions, coupons, orders) and the payment provider
//! are traits. `memory` provides in-process implementations for tests and
//! local runs; the server crate provides PostgreSQL ones.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupon;
pub mod error;
pub mod memory;
pub mod order;
pub mod payment;
pub mod pipeline;
pub mod pricing;
pub mod session;

// --- Re-exports for the Public API ---

pub use crate::cart::{Cart, CartLine, CartLineView, CartService, CartSummary};
pub use crate::catalog::{CatalogStore, Product, ProductId};
pub use crate::checkout::{CheckoutForm, DeliveryDetails, OrderBuilder};
pub use crate::coupon::{Coupon, CouponId, CouponResolver, CouponStore};
pub use crate::error::{PipelineError, ShopError, ShopResult};
pub use crate::order::{
  Address, AddressId, AnonymousContact, Customer, DeliveryMethod, NewOrder, Order, OrderId, OrderLine,
  OrderNumberGenerator, OrderService, OrderStatus, OrderStore, PaymentMethod, UserId,
};
pub use crate::payment::{
  CheckoutSession, PaymentGateway, PaymentService, PaymentStart, WebhookOutcome, WebhookVerifier,
};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::session::{SessionKey, SessionStore};
