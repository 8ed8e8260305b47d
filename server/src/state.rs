// larder/server/src/state.rs

use crate::config::AppConfig;
use larder::{
  CartService, CatalogStore, CouponResolver, CouponStore, OrderBuilder, OrderNumberGenerator, OrderService, OrderStore,
  PaymentGateway, PaymentService, SessionStore, WebhookVerifier,
};
use std::sync::Arc;

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<dyn CatalogStore>,
  pub carts: CartService,
  pub orders: OrderService,
  pub builder: OrderBuilder,
  pub payments: PaymentService,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the domain services over `store`, which backs catalog, sessions, coupons and orders.
  pub fn new<S>(store: Arc<S>, gateway: Arc<dyn PaymentGateway>, config: Arc<AppConfig>) -> Self
  where
    S: CatalogStore + SessionStore + CouponStore + OrderStore + 'static,
  {
    let catalog: Arc<dyn CatalogStore> = store.clone();
    let sessions: Arc<dyn SessionStore> = store.clone();
    let coupon_store: Arc<dyn CouponStore> = store.clone();
    let order_store: Arc<dyn OrderStore> = store;

    let carts = CartService::new(Arc::clone(&catalog), sessions, CouponResolver::new(coupon_store));
    let orders = OrderService::new(Arc::clone(&order_store));
    let builder = OrderBuilder::new(
      carts.clone(),
      Arc::clone(&catalog),
      order_store,
      OrderNumberGenerator::random(),
      config.packaging_fee,
    );
    let verifier = WebhookVerifier::new(config.stripe_webhook_secret.as_bytes());
    let payments = PaymentService::new(gateway, orders.clone(), verifier);

    Self {
      catalog,
      carts,
      orders,
      builder,
      payments,
      config,
    }
  }
}
