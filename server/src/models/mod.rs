// larder/server/src/models/mod.rs

//! Row types as read from PostgreSQL, and their conversion into domain values.

pub mod address;
pub mod coupon;
pub mod order;
pub mod product;

pub use address::AddressRow;
pub use coupon::CouponRow;
pub use order::{OrderLineRow, OrderRow};
pub use product::ProductRow;
