// larder/src/memory.rs

//! In-process stores for tests and local runs.
//!
//! One `MemoryStore` serves as catalog, session, coupon and order store.
//! Every operation takes a single `parking_lot` lock, so `commit` is atomic.

use crate::catalog::{CatalogStore, Product, ProductId};
use crate::coupon::{Coupon, CouponId, CouponStore};
use crate::error::{ShopError, ShopResult};
use crate::order::{Address, AddressId, NewOrder, Order, OrderId, OrderStatus, OrderStore, UserId};
use crate::session::{SessionKey, SessionStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
  products: HashMap<ProductId, Product>,
  coupons: Vec<Coupon>,
  sessions: HashMap<String, Vec<u8>>,
  orders: HashMap<OrderId, Order>,
  addresses: HashMap<AddressId, Address>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_product(&self, product: Product) {
    self.state.lock().products.insert(product.id, product);
  }

  pub fn insert_coupon(&self, coupon: Coupon) {
    self.state.lock().coupons.push(coupon);
  }

  pub fn insert_address(&self, address: Address) {
    self.state.lock().addresses.insert(address.id, address);
  }

  pub fn product(&self, id: ProductId) -> Option<Product> {
    self.state.lock().products.get(&id).cloned()
  }

  pub fn order_count(&self) -> usize {
    self.state.lock().orders.len()
  }

  pub fn session_count(&self) -> usize {
    self.state.lock().sessions.len()
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn find_product(&self, id: ProductId) -> ShopResult<Option<Product>> {
    Ok(self.state.lock().products.get(&id).cloned())
  }

  async fn list_products(&self) -> ShopResult<Vec<Product>> {
    let mut products: Vec<_> = self.state.lock().products.values().cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }
}

#[async_trait]
impl SessionStore for MemoryStore {
  async fn load(&self, key: &SessionKey) -> ShopResult<Option<Vec<u8>>> {
    Ok(self.state.lock().sessions.get(key.as_str()).cloned())
  }

  async fn save(&self, key: &SessionKey, data: Vec<u8>) -> ShopResult<()> {
    self.state.lock().sessions.insert(key.as_str().to_string(), data);
    Ok(())
  }

  async fn delete(&self, key: &SessionKey) -> ShopResult<()> {
    self.state.lock().sessions.remove(key.as_str());
    Ok(())
  }
}

#[async_trait]
impl CouponStore for MemoryStore {
  async fn find_by_code(&self, code: &str) -> ShopResult<Vec<Coupon>> {
    let state = self.state.lock();
    Ok(state.coupons.iter().filter(|c| c.code.eq_ignore_ascii_case(code)).cloned().collect())
  }

  async fn find_coupon(&self, id: CouponId) -> ShopResult<Option<Coupon>> {
    Ok(self.state.lock().coupons.iter().find(|c| c.id == id).cloned())
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn order_number_exists(&self, order_number: &str) -> ShopResult<bool> {
    Ok(self.state.lock().orders.values().any(|o| o.order_number == order_number))
  }

  async fn commit(&self, order: NewOrder) -> ShopResult<Order> {
    let mut state = self.state.lock();
    if state.orders.values().any(|o| o.order_number == order.order_number) {
      return Err(ShopError::DuplicateOrderNumber(order.order_number));
    }
    if let Some(line) = order.lines.iter().find(|l| !state.products.contains_key(&l.product_id)) {
      return Err(ShopError::not_found("Product", line.product_id));
    }
    for line in &order.lines {
      if let Some(product) = state.products.get_mut(&line.product_id) {
        product.times_ordered += 1;
      }
    }
    let order = Order::from_new(order, Uuid::new_v4(), Utc::now());
    state.orders.insert(order.id, order.clone());
    Ok(order)
  }

  async fn find_order(&self, id: OrderId) -> ShopResult<Option<Order>> {
    Ok(self.state.lock().orders.get(&id).cloned())
  }

  async fn list_for_user(&self, user_id: UserId) -> ShopResult<Vec<Order>> {
    let mut orders: Vec<_> = self
      .state
      .lock()
      .orders
      .values()
      .filter(|o| o.user_id == Some(user_id))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn delete_order(&self, id: OrderId) -> ShopResult<bool> {
    Ok(self.state.lock().orders.remove(&id).is_some())
  }

  async fn update_status(&self, id: OrderId, status: OrderStatus) -> ShopResult<Order> {
    let mut state = self.state.lock();
    let order = state.orders.get_mut(&id).ok_or_else(|| ShopError::not_found("Order", id))?;
    order.status = status;
    Ok(order.clone())
  }

  async fn mark_paid(&self, id: OrderId) -> ShopResult<Order> {
    let mut state = self.state.lock();
    let order = state.orders.get_mut(&id).ok_or_else(|| ShopError::not_found("Order", id))?;
    order.paid = true;
    Ok(order.clone())
  }

  async fn get_address(&self, id: AddressId) -> ShopResult<Option<Address>> {
    Ok(self.state.lock().addresses.get(&id).cloned())
  }
}
