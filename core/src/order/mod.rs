// larder/src/order/mod.rs

//! Orders: the persisted snapshot of a checkout and the rules for what may
//! happen to it afterwards.

pub mod model;
pub mod number;
pub mod service;
pub mod store;

pub use model::{
  Address, AddressId, AnonymousContact, Customer, DeliveryMethod, NewOrder, Order, OrderId, OrderLine, OrderStatus,
  PaymentMethod, UserId,
};
pub use number::OrderNumberGenerator;
pub use service::OrderService;
pub use store::OrderStore;
