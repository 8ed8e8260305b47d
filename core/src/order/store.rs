// larder/src/order/store.rs

use super::model::{Address, AddressId, NewOrder, Order, OrderId, OrderStatus, UserId};
use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn order_number_exists(&self, order_number: &str) -> ShopResult<bool>;

  /// Persists the order with its lines and bumps `times_ordered` of every
  /// ordered product, all or nothing.
  ///
  /// Fails with `ShopError::DuplicateOrderNumber` when the number is taken.
  async fn commit(&self, order: NewOrder) -> ShopResult<Order>;

  async fn find_order(&self, id: OrderId) -> ShopResult<Option<Order>>;

  /// Orders of `user_id`, newest first.
  async fn list_for_user(&self, user_id: UserId) -> ShopResult<Vec<Order>>;

  /// Returns `false` when there was nothing to delete.
  async fn delete_order(&self, id: OrderId) -> ShopResult<bool>;

  async fn update_status(&self, id: OrderId, status: OrderStatus) -> ShopResult<Order>;

  async fn mark_paid(&self, id: OrderId) -> ShopResult<Order>;

  async fn get_address(&self, id: AddressId) -> ShopResult<Option<Address>>;

  async fn get_order(&self, id: OrderId) -> ShopResult<Order> {
    self.find_order(id).await?.ok_or_else(|| ShopError::not_found("Order", id))
  }
}
