// larder/src/order/service.rs

use super::model::{Customer, Order, OrderId, OrderStatus, UserId};
use super::store::OrderStore;
use crate::error::{ShopError, ShopResult};
use crate::session::SessionKey;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Ownership and status rules around stored orders.
#[derive(Clone)]
pub struct OrderService {
  store: Arc<dyn OrderStore>,
}

impl OrderService {
  pub fn new(store: Arc<dyn OrderStore>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &Arc<dyn OrderStore> {
    &self.store
  }

  /// An order as seen by `customer`. Only the owning user may read it;
  /// anonymous orders are not readable through this path.
  #[instrument(name = "OrderService::get", skip(self), err(Display))]
  pub async fn get(&self, id: OrderId, customer: Customer) -> ShopResult<Order> {
    let order = self.store.get_order(id).await?;
    match (order.user_id, customer.user_id()) {
      (Some(owner), Some(user)) if owner == user => Ok(order),
      _ => {
        warn!(order_id = %id, "Order access denied.");
        Err(ShopError::PermissionDenied(format!("order {id} does not belong to the caller")))
      }
    }
  }

  /// An anonymous order as seen by the session that placed it.
  #[instrument(name = "OrderService::get_for_guest", skip(self, session), err(Display))]
  pub async fn get_for_guest(&self, id: OrderId, session: &SessionKey) -> ShopResult<Order> {
    let order = self.store.get_order(id).await?;
    if order.placed_by_guest(session) {
      Ok(order)
    } else {
      warn!(order_id = %id, "Guest order access denied.");
      Err(ShopError::PermissionDenied(format!("order {id} was not placed from this session")))
    }
  }

  /// Unchecked lookup for trusted callers such as the payment webhook.
  pub async fn lookup(&self, id: OrderId) -> ShopResult<Order> {
    self.store.get_order(id).await
  }

  pub async fn list_for_user(&self, user_id: UserId) -> ShopResult<Vec<Order>> {
    self.store.list_for_user(user_id).await
  }

  /// Deletes an order of `user_id` that has not entered processing yet.
  #[instrument(name = "OrderService::delete", skip(self), err(Display))]
  pub async fn delete(&self, id: OrderId, user_id: UserId) -> ShopResult<()> {
    let order = self.store.get_order(id).await?;
    match order.user_id {
      None => return Err(ShopError::PermissionDenied("anonymous orders cannot be deleted".into())),
      Some(owner) if owner != user_id => {
        return Err(ShopError::PermissionDenied(format!("order {id} does not belong to the caller")))
      }
      Some(_) => {}
    }
    if order.status != OrderStatus::Ordered {
      return Err(ShopError::RestrictedStatusTransition {
        status: order.status.to_string(),
        action: "deleted",
      });
    }
    if !self.store.delete_order(id).await? {
      return Err(ShopError::not_found("Order", id));
    }
    info!(order_number = %order.order_number, "Order deleted.");
    Ok(())
  }

  /// Moves the order one status forward.
  #[instrument(name = "OrderService::advance_status", skip(self), err(Display))]
  pub async fn advance_status(&self, id: OrderId) -> ShopResult<Order> {
    let order = self.store.get_order(id).await?;
    let next = order.status.next().ok_or_else(|| ShopError::RestrictedStatusTransition {
      status: order.status.to_string(),
      action: "advanced",
    })?;
    let updated = self.store.update_status(id, next).await?;
    info!(from = %order.status, to = %next, "Order status advanced.");
    Ok(updated)
  }
}
