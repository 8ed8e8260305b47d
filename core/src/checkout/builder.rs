// larder/src/checkout/builder.rs

use super::context::{CheckoutState, PricedOrder};
use super::form::{CheckoutForm, DeliveryDetails};
use crate::cart::CartService;
use crate::catalog::CatalogStore;
use crate::coupon::CouponResolver;
use crate::error::{PipelineError, ShopError, ShopResult};
use crate::order::{Customer, DeliveryMethod, NewOrder, Order, OrderLine, OrderNumberGenerator, OrderStore};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::pricing;
use crate::session::SessionKey;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const CHECKOUT_STEPS: &[(&str, bool)] = &[
  ("load_cart", false),
  ("check_methods", false),
  ("resolve_recipient", false),
  ("price_lines", false),
  ("commit_order", false),
  ("clear_cart", false),
];

const COMMIT_ATTEMPTS: usize = 3;

type Ctx = ContextData<CheckoutState>;

fn missing(step_name: &str, field: &'static str) -> ShopError {
  ShopError::Pipeline(PipelineError::MissingState {
    step_name: step_name.to_string(),
    field,
  })
}

/// Builds orders from carts.
///
/// Nothing is written before `commit_order`; the order and its product
/// counters are persisted in one store call.
#[derive(Clone)]
pub struct OrderBuilder {
  pipeline: Arc<Pipeline<CheckoutState, ShopError>>,
}

impl OrderBuilder {
  pub fn new(
    carts: CartService,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    numbers: OrderNumberGenerator,
    packaging_fee: Decimal,
  ) -> Self {
    let mut p = Pipeline::<CheckoutState, ShopError>::new("checkout", CHECKOUT_STEPS);

    let c = carts.clone();
    p.on_step("load_cart", move |ctx: Ctx| {
      let carts = c.clone();
      async move { load_cart(&carts, ctx).await }
    });

    p.on_step("check_methods", |ctx: Ctx| async move { check_methods(&ctx) });

    let o = Arc::clone(&orders);
    p.on_step("resolve_recipient", move |ctx: Ctx| {
      let orders = Arc::clone(&o);
      async move { resolve_recipient(orders.as_ref(), ctx).await }
    });

    let coupons = carts.coupons().clone();
    p.on_step("price_lines", move |ctx: Ctx| {
      let catalog = Arc::clone(&catalog);
      let coupons = coupons.clone();
      async move { price_lines(catalog.as_ref(), &coupons, packaging_fee, ctx).await }
    });

    p.on_step("commit_order", move |ctx: Ctx| {
      let orders = Arc::clone(&orders);
      let numbers = numbers.clone();
      async move { commit_order(orders.as_ref(), &numbers, ctx).await }
    });

    p.on_step("clear_cart", move |ctx: Ctx| {
      let carts = carts.clone();
      async move { clear_cart(&carts, ctx).await }
    });

    Self { pipeline: Arc::new(p) }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.pipeline.step_names()
  }

  pub async fn build(&self, session: &SessionKey, customer: Customer, form: CheckoutForm) -> ShopResult<Order> {
    self.build_at(session, customer, form, Utc::now()).await
  }

  /// Runs the checkout as of `now`, which decides coupon validity and the order date.
  #[instrument(
    name = "OrderBuilder::build",
    skip(self, session, form),
    fields(session = %session, payment = form.payment_method.as_str(), delivery = form.delivery_method.as_str()),
    err(Display)
  )]
  pub async fn build_at(
    &self,
    session: &SessionKey,
    customer: Customer,
    form: CheckoutForm,
    now: DateTime<Utc>,
  ) -> ShopResult<Order> {
    let ctx = ContextData::new(CheckoutState::new(session.clone(), customer, form, now));
    match self.pipeline.run(ctx.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped => return Err(missing("checkout", "order")),
    }
    let order = ctx.write().order.take();
    order.ok_or_else(|| missing("commit_order", "order"))
  }
}

async fn load_cart(carts: &CartService, ctx: Ctx) -> ShopResult<PipelineControl> {
  let session = ctx.read().session.clone();
  let cart = carts.load(&session).await?;
  if cart.is_empty() {
    return Err(ShopError::EmptyCart);
  }
  ctx.write().cart = Some(cart);
  Ok(PipelineControl::Continue)
}

fn check_methods(ctx: &Ctx) -> ShopResult<PipelineControl> {
  let (payment, delivery) = ctx.with(|s| (s.form.payment_method, s.form.delivery_method));
  if !payment.compatible_with(delivery) {
    return Err(ShopError::IncompatiblePaymentDelivery {
      payment: payment.as_str().to_string(),
      delivery: delivery.as_str().to_string(),
    });
  }
  Ok(PipelineControl::Continue)
}

async fn resolve_recipient(orders: &dyn OrderStore, ctx: Ctx) -> ShopResult<PipelineControl> {
  let (customer, delivery_method, delivery, contact) = ctx.with(|s| {
    (
      s.customer,
      s.form.delivery_method,
      s.form.delivery.clone(),
      s.form.contact.clone(),
    )
  });

  let contact = match customer {
    Customer::User(_) => None,
    Customer::Anonymous => {
      let contact =
        contact.ok_or_else(|| ShopError::Validation("contact details are required for guest checkout".into()))?;
      Some(contact.normalized()?)
    }
  };

  let (address, address_id) = match delivery_method {
    DeliveryMethod::PickupPoint => (None, None),
    DeliveryMethod::Courier => match (delivery, customer) {
      (DeliveryDetails::Saved { address_id }, Customer::User(user_id)) => {
        let saved = orders
          .get_address(address_id)
          .await?
          .filter(|a| a.user_id == user_id)
          .ok_or_else(|| ShopError::not_found("Address", address_id))?;
        (Some(saved.address), Some(address_id))
      }
      (DeliveryDetails::Saved { .. }, Customer::Anonymous) => {
        return Err(ShopError::Validation("saved addresses require a signed-in user".into()))
      }
      (DeliveryDetails::Text { address }, _) if !address.trim().is_empty() => (Some(address.trim().to_string()), None),
      _ => return Err(ShopError::MissingAddress),
    },
  };

  let mut state = ctx.write();
  state.contact = contact;
  state.address = address;
  state.address_id = address_id;
  Ok(PipelineControl::Continue)
}

async fn price_lines(
  catalog: &dyn CatalogStore,
  coupons: &CouponResolver,
  packaging_fee: Decimal,
  ctx: Ctx,
) -> ShopResult<PipelineControl> {
  let (cart, packaging, now) = ctx.with(|s| (s.cart.clone(), s.form.packaging, s.now));
  let cart = cart.ok_or_else(|| missing("price_lines", "cart"))?;

  let mut lines = Vec::with_capacity(cart.len());
  for cart_line in cart.lines() {
    let product = catalog.get_product(cart_line.product_id).await?;
    lines.push(OrderLine {
      product_id: product.id,
      product_name: product.name.clone(),
      quantity: cart_line.quantity,
      price: product.final_price(),
    });
  }

  let subtotal = pricing::sum_lines(lines.iter().map(OrderLine::total_price));
  let packaging_fee = if packaging { pricing::round_money(packaging_fee) } else { Decimal::ZERO };
  let gross = subtotal + packaging_fee;

  let coupon = match cart.coupon_id() {
    Some(id) => {
      let coupon = coupons.revalidate(id, now).await?;
      if coupon.is_none() {
        warn!(coupon_id = %id, "Attached coupon is no longer valid, ordering without it.");
      }
      coupon
    }
    None => None,
  };
  let discount_amount = CouponResolver::discount_amount(coupon.as_ref(), gross);

  ctx.write().priced = Some(PricedOrder {
    lines,
    subtotal,
    packaging_fee,
    coupon,
    discount_amount,
    total_price: pricing::round_money(gross - discount_amount),
  });
  Ok(PipelineControl::Continue)
}

async fn commit_order(orders: &dyn OrderStore, numbers: &OrderNumberGenerator, ctx: Ctx) -> ShopResult<PipelineControl> {
  let draft = ctx.with(|s| {
    s.priced.clone().map(|priced| NewOrder {
      order_number: String::new(),
      user_id: s.customer.user_id(),
      contact: s.contact.clone(),
      lines: priced.lines,
      packaging_fee: priced.packaging_fee,
      coupon_id: priced.coupon.as_ref().map(|c| c.id),
      coupon_discount: priced.coupon.as_ref().map(|c| c.discount),
      discount_amount: priced.discount_amount,
      total_price: priced.total_price,
      payment_method: s.form.payment_method,
      delivery_method: s.form.delivery_method,
      address: s.address.clone(),
      address_id: s.address_id,
      comment: s.form.comment.clone().filter(|c| !c.trim().is_empty()),
      guest_session: match s.customer {
        Customer::Anonymous => Some(s.session.clone()),
        Customer::User(_) => None,
      },
    })
  });
  let draft = draft.ok_or_else(|| missing("commit_order", "priced"))?;
  let date = ctx.with(|s| s.now.date_naive());

  let mut last_number = String::new();
  for attempt in 1..=COMMIT_ATTEMPTS {
    let order_number = numbers.allocate(orders, date).await?;
    let new_order = NewOrder {
      order_number: order_number.clone(),
      ..draft.clone()
    };
    match orders.commit(new_order).await {
      Ok(order) => {
        info!(order_id = %order.id, order_number = %order.order_number, total = %order.total_price, "Order committed.");
        ctx.write().order = Some(order);
        return Ok(PipelineControl::Continue);
      }
      Err(ShopError::DuplicateOrderNumber(number)) => {
        warn!(attempt, %number, "Order number collided on commit, retrying.");
        last_number = number;
      }
      Err(e) => return Err(e),
    }
  }
  Err(ShopError::DuplicateOrderNumber(last_number))
}

async fn clear_cart(carts: &CartService, ctx: Ctx) -> ShopResult<PipelineControl> {
  let session = ctx.read().session.clone();
  match carts.clear(&session).await {
    Ok(()) => ctx.write().cart_cleared = true,
    // The order exists at this point; a stale cart is the lesser problem.
    Err(e) => error!(error = %e, "Order committed but the cart could not be cleared."),
  }
  Ok(PipelineControl::Continue)
}
