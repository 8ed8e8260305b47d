// larder/src/cart/mod.rs

//! The session cart: a value object (`Cart`) and the service that loads,
//! mutates and stores it per request (`CartService`).

pub mod model;
pub mod service;

pub use model::{AppliedCoupon, Cart, CartLine, CartLineView, CartSummary};
pub use service::CartService;
