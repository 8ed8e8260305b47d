// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use larder::memory::MemoryStore;
use larder::{
  Address, AddressId, CartService, CheckoutSession, Coupon, CouponResolver, NewOrder, Order, OrderBuilder, OrderId,
  OrderNumberGenerator, OrderService, OrderStatus, OrderStore, PaymentGateway, PaymentService, Product, SessionKey,
  ShopError, ShopResult, UserId, WebhookVerifier,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_larder_tests";

// --- Fixtures ---

pub fn product(name: &str, price: Decimal) -> Product {
  Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    price,
    discount: Decimal::ZERO,
    amount: 100,
    unit: "pcs".to_string(),
    times_ordered: 0,
  }
}

/// A coupon valid from `start_hours` to `end_hours` relative to now.
pub fn coupon(code: &str, discount: Decimal, start_hours: Option<i64>, end_hours: Option<i64>) -> Coupon {
  let now = Utc::now();
  Coupon {
    id: Uuid::new_v4(),
    code: code.to_string(),
    discount,
    active: true,
    start_time: start_hours.map(|h| now + Duration::hours(h)),
    end_time: end_hours.map(|h| now + Duration::hours(h)),
  }
}

pub fn address(user_id: UserId, text: &str) -> Address {
  Address {
    id: Uuid::new_v4(),
    user_id,
    address: text.to_string(),
  }
}

// --- Fake payment provider ---

#[derive(Debug, Default)]
pub struct FakeGateway {
  pub calls: AtomicUsize,
  pub fail: AtomicBool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
  fn name(&self) -> &'static str {
    "fake"
  }

  async fn create_checkout_session(&self, order: &Order) -> ShopResult<CheckoutSession> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail.load(Ordering::SeqCst) {
      return Err(ShopError::gateway(anyhow::anyhow!("provider rejected the API key")));
    }
    Ok(CheckoutSession {
      id: format!("cs_test_{}", order.id.simple()),
      url: format!("https://pay.example.test/c/{}", order.id),
    })
  }
}

// --- Order store that reports number collisions on commit ---

/// Wraps `MemoryStore` and rejects the first `duplicates` commits as if a
/// concurrent checkout had taken the number between check and insert.
pub struct CollidingOrderStore {
  pub inner: Arc<MemoryStore>,
  pub duplicates: AtomicUsize,
  pub commits: AtomicUsize,
}

impl CollidingOrderStore {
  pub fn new(inner: Arc<MemoryStore>, duplicates: usize) -> Self {
    Self {
      inner,
      duplicates: AtomicUsize::new(duplicates),
      commits: AtomicUsize::new(0),
    }
  }
}

#[async_trait]
impl OrderStore for CollidingOrderStore {
  async fn order_number_exists(&self, order_number: &str) -> ShopResult<bool> {
    self.inner.order_number_exists(order_number).await
  }

  async fn commit(&self, order: NewOrder) -> ShopResult<Order> {
    self.commits.fetch_add(1, Ordering::SeqCst);
    let left = self.duplicates.load(Ordering::SeqCst);
    if left > 0 {
      self.duplicates.store(left - 1, Ordering::SeqCst);
      return Err(ShopError::DuplicateOrderNumber(order.order_number));
    }
    self.inner.commit(order).await
  }

  async fn find_order(&self, id: OrderId) -> ShopResult<Option<Order>> {
    self.inner.find_order(id).await
  }

  async fn list_for_user(&self, user_id: UserId) -> ShopResult<Vec<Order>> {
    self.inner.list_for_user(user_id).await
  }

  async fn delete_order(&self, id: OrderId) -> ShopResult<bool> {
    self.inner.delete_order(id).await
  }

  async fn update_status(&self, id: OrderId, status: OrderStatus) -> ShopResult<Order> {
    self.inner.update_status(id, status).await
  }

  async fn mark_paid(&self, id: OrderId) -> ShopResult<Order> {
    self.inner.mark_paid(id).await
  }

  async fn get_address(&self, id: AddressId) -> ShopResult<Option<Address>> {
    self.inner.get_address(id).await
  }
}

// --- Wired services ---

pub struct Shop {
  pub store: Arc<MemoryStore>,
  pub carts: CartService,
  pub orders: OrderService,
  pub builder: OrderBuilder,
  pub payments: PaymentService,
  pub gateway: Arc<FakeGateway>,
}

pub struct ShopOptions {
  pub packaging_fee: Decimal,
  pub numbers: OrderNumberGenerator,
  pub order_store: Option<Arc<dyn OrderStore>>,
}

impl Default for ShopOptions {
  fn default() -> Self {
    Self {
      packaging_fee: Decimal::ZERO,
      numbers: OrderNumberGenerator::random(),
      order_store: None,
    }
  }
}

pub fn shop() -> Shop {
  shop_with(Arc::new(MemoryStore::new()), ShopOptions::default())
}

pub fn shop_with(store: Arc<MemoryStore>, options: ShopOptions) -> Shop {
  let order_store: Arc<dyn OrderStore> = match options.order_store {
    Some(custom) => custom,
    None => store.clone(),
  };
  let coupons = CouponResolver::new(store.clone());
  let carts = CartService::new(store.clone(), store.clone(), coupons);
  let orders = OrderService::new(Arc::clone(&order_store));
  let builder = OrderBuilder::new(
    carts.clone(),
    store.clone(),
    order_store,
    options.numbers,
    options.packaging_fee,
  );
  let gateway = Arc::new(FakeGateway::default());
  let payments = PaymentService::new(gateway.clone(), orders.clone(), WebhookVerifier::new(WEBHOOK_SECRET));
  Shop {
    store,
    carts,
    orders,
    builder,
    payments,
    gateway,
  }
}

pub fn session() -> SessionKey {
  SessionKey::generate()
}

pub fn now() -> DateTime<Utc> {
  Utc::now()
}

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
