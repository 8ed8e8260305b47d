// larder/src/cart/service.rs

use super::model::{Cart, CartSummary};
use crate::catalog::{CatalogStore, ProductId};
use crate::coupon::{Coupon, CouponResolver};
use crate::error::ShopResult;
use crate::session::{SessionKey, SessionStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Loads a session's cart, applies one mutation and writes it back.
#[derive(Clone)]
pub struct CartService {
  catalog: Arc<dyn CatalogStore>,
  sessions: Arc<dyn SessionStore>,
  coupons: CouponResolver,
}

impl CartService {
  pub fn new(catalog: Arc<dyn CatalogStore>, sessions: Arc<dyn SessionStore>, coupons: CouponResolver) -> Self {
    Self {
      catalog,
      sessions,
      coupons,
    }
  }

  pub fn coupons(&self) -> &CouponResolver {
    &self.coupons
  }

  /// Reads the cart of `key`. A session without a cart yields an empty one;
  /// an unreadable payload is discarded.
  pub async fn load(&self, key: &SessionKey) -> ShopResult<Cart> {
    match self.sessions.load(key).await? {
      None => Ok(Cart::default()),
      Some(bytes) => match Cart::from_bytes(&bytes) {
        Ok(cart) => Ok(cart),
        Err(e) => {
          warn!(session = %key, error = %e, "Discarding undecodable cart.");
          Ok(Cart::default())
        }
      },
    }
  }

  pub async fn save(&self, key: &SessionKey, cart: &Cart) -> ShopResult<()> {
    self.sessions.save(key, cart.to_bytes()?).await
  }

  #[instrument(name = "CartService::add", skip(self, key), fields(session = %key), err(Display))]
  pub async fn add(&self, key: &SessionKey, product_id: ProductId, quantity: i64) -> ShopResult<Cart> {
    let quantity = Cart::checked_quantity(quantity)?;
    let product = self.catalog.get_product(product_id).await?;

    let mut cart = self.load(key).await?;
    cart.set_line(&product, quantity, Utc::now())?;
    self.save(key, &cart).await?;
    debug!(lines = cart.len(), "Cart line set.");
    Ok(cart)
  }

  /// Sets the quantity of a line already in the cart; zero removes the line.
  #[instrument(name = "CartService::update", skip(self, key), fields(session = %key), err(Display))]
  pub async fn update(&self, key: &SessionKey, product_id: ProductId, quantity: i64) -> ShopResult<Cart> {
    let quantity = match quantity {
      0 => 0,
      q => Cart::checked_quantity(q)?,
    };
    let mut cart = self.load(key).await?;
    cart.update_quantity(product_id, quantity)?;
    self.save(key, &cart).await?;
    Ok(cart)
  }

  #[instrument(name = "CartService::remove", skip(self, key), fields(session = %key), err(Display))]
  pub async fn remove(&self, key: &SessionKey, product_id: ProductId) -> ShopResult<Cart> {
    let mut cart = self.load(key).await?;
    cart.remove(product_id)?;
    self.save(key, &cart).await?;
    Ok(cart)
  }

  /// Drops the whole cart, coupon included.
  #[instrument(name = "CartService::clear", skip_all, fields(session = %key))]
  pub async fn clear(&self, key: &SessionKey) -> ShopResult<()> {
    self.sessions.delete(key).await?;
    info!("Cart cleared.");
    Ok(())
  }

  /// Attaches the coupon matching `code`. On failure any coupon attached
  /// earlier is detached before the error is returned.
  #[instrument(name = "CartService::apply_coupon", skip(self, key), fields(session = %key), err(Display))]
  pub async fn apply_coupon(&self, key: &SessionKey, code: &str, now: DateTime<Utc>) -> ShopResult<Coupon> {
    let mut cart = self.load(key).await?;
    match self.coupons.resolve(code, now).await {
      Ok(coupon) => {
        cart.attach_coupon(&coupon);
        self.save(key, &cart).await?;
        Ok(coupon)
      }
      Err(e) => {
        if cart.coupon_id().is_some() {
          cart.detach_coupon();
          self.save(key, &cart).await?;
        }
        Err(e)
      }
    }
  }

  #[instrument(name = "CartService::remove_coupon", skip_all, fields(session = %key))]
  pub async fn remove_coupon(&self, key: &SessionKey) -> ShopResult<Cart> {
    let mut cart = self.load(key).await?;
    if cart.coupon_id().is_some() {
      cart.detach_coupon();
      self.save(key, &cart).await?;
    }
    Ok(cart)
  }

  /// The attached coupon if it is still valid at `now`.
  pub async fn attached_coupon(&self, cart: &Cart, now: DateTime<Utc>) -> ShopResult<Option<Coupon>> {
    match cart.coupon_id() {
      Some(id) => self.coupons.revalidate(id, now).await,
      None => Ok(None),
    }
  }

  pub async fn summary(&self, key: &SessionKey, now: DateTime<Utc>) -> ShopResult<CartSummary> {
    let cart = self.load(key).await?;
    let coupon = self.attached_coupon(&cart, now).await?;
    Ok(cart.summary(coupon.as_ref()))
  }
}
