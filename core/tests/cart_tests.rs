// tests/cart_tests.rs
mod common;

use common::*;
use larder::ShopError;
use rust_decimal_macros::dec;
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_add_replaces_quantity_instead_of_incrementing() {
  setup_tracing();
  let shop = shop();
  let apples = product("Apples", dec!(2.40));
  shop.store.insert_product(apples.clone());
  let key = session();

  for quantity in [1, 4, 2, 9] {
    shop.carts.add(&key, apples.id, quantity).await.expect("add should succeed");
    let cart = shop.carts.load(&key).await.expect("load");
    let lines: Vec<_> = cart.list().collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(i64::from(lines[0].quantity), quantity);
  }
}

#[tokio::test]
#[serial]
async fn test_add_rejects_unknown_product_and_bad_quantity() {
  setup_tracing();
  let shop = shop();
  let bread = product("Bread", dec!(3.10));
  shop.store.insert_product(bread.clone());
  let key = session();

  let err = shop.carts.add(&key, Uuid::new_v4(), 1).await.expect_err("unknown product");
  assert!(matches!(err, ShopError::NotFound { entity: "Product", .. }));

  for quantity in [0, -1] {
    let err = shop.carts.add(&key, bread.id, quantity).await.expect_err("bad quantity");
    assert!(matches!(err, ShopError::InvalidQuantity(q) if q == quantity));
  }
  assert!(shop.carts.load(&key).await.expect("load").is_empty());
}

#[tokio::test]
#[serial]
async fn test_update_to_zero_removes_the_line() {
  setup_tracing();
  let shop = shop();
  let milk = product("Milk", dec!(1.19));
  let eggs = product("Eggs", dec!(2.99));
  shop.store.insert_product(milk.clone());
  shop.store.insert_product(eggs.clone());
  let key = session();

  shop.carts.add(&key, milk.id, 2).await.expect("add milk");
  shop.carts.add(&key, eggs.id, 1).await.expect("add eggs");
  let cart = shop.carts.update(&key, milk.id, 5).await.expect("update");
  assert_eq!(cart.get(milk.id).map(|l| l.quantity), Some(5));

  let cart = shop.carts.update(&key, milk.id, 0).await.expect("update to zero");
  assert!(cart.get(milk.id).is_none());
  assert_eq!(cart.len(), 1);

  let err = shop.carts.update(&key, milk.id, 3).await.expect_err("line is gone");
  assert!(matches!(err, ShopError::NotFound { .. }));
  let err = shop.carts.update(&key, eggs.id, -2).await.expect_err("negative");
  assert!(matches!(err, ShopError::InvalidQuantity(-2)));
}

#[tokio::test]
#[serial]
async fn test_remove_missing_line_is_not_found() {
  setup_tracing();
  let shop = shop();
  let key = session();
  let err = shop.carts.remove(&key, Uuid::new_v4()).await.expect_err("nothing to remove");
  assert!(matches!(err, ShopError::NotFound { entity: "Cart line", .. }));
}

#[tokio::test]
#[serial]
async fn test_totals_sum_quantity_times_final_price() {
  setup_tracing();
  let shop = shop();
  let mut cheese = product("Cheese", dec!(7.35));
  cheese.discount = dec!(10);
  let olives = product("Olives", dec!(4.05));
  shop.store.insert_product(cheese.clone());
  shop.store.insert_product(olives.clone());
  let key = session();

  shop.carts.add(&key, cheese.id, 3).await.expect("cheese");
  shop.carts.add(&key, olives.id, 2).await.expect("olives");
  let cart = shop.carts.load(&key).await.expect("load");

  // Cheese final price 7.35 - 0.735 = 6.615 -> 6.62
  assert_eq!(cart.total_quantity(), 5);
  assert_eq!(cart.total_price(), dec!(19.86) + dec!(8.10));

  // Listing twice yields the same views in insertion order.
  let first: Vec<_> = cart.list().collect();
  let second: Vec<_> = cart.list().collect();
  assert_eq!(first, second);
  assert_eq!(first[0].name, "Cheese");
  assert_eq!(first[0].total_price, dec!(19.86));
}

#[tokio::test]
#[serial]
async fn test_coupon_code_is_case_insensitive() {
  setup_tracing();
  let shop = shop();
  let tea = product("Tea", dec!(5.00));
  shop.store.insert_product(tea.clone());
  shop.store.insert_coupon(coupon("Autumn15", dec!(15), Some(-1), Some(1)));
  let key = session();
  shop.carts.add(&key, tea.id, 4).await.expect("add");

  let applied = shop.carts.apply_coupon(&key, "  autumn15 ", now()).await.expect("apply");
  assert_eq!(applied.discount, dec!(15));

  let summary = shop.carts.summary(&key, now()).await.expect("summary");
  assert_eq!(summary.total_price, dec!(20.00));
  assert_eq!(summary.discount_amount, dec!(3.00));
  assert_eq!(summary.total_after_discount, dec!(17.00));
  assert_eq!(summary.coupon.map(|c| c.code), Some("Autumn15".to_string()));
}

#[tokio::test]
#[serial]
async fn test_coupon_outside_window_fails_and_clears_previous_coupon() {
  setup_tracing();
  let shop = shop();
  let tea = product("Tea", dec!(5.00));
  shop.store.insert_product(tea.clone());
  shop.store.insert_coupon(coupon("NOW10", dec!(10), None, None));
  shop.store.insert_coupon(coupon("LATER", dec!(50), Some(24), None));
  shop.store.insert_coupon(coupon("GONE", dec!(50), None, Some(-24)));
  let key = session();
  shop.carts.add(&key, tea.id, 1).await.expect("add");

  shop.carts.apply_coupon(&key, "NOW10", now()).await.expect("valid coupon");
  assert!(shop.carts.load(&key).await.expect("load").coupon_id().is_some());

  for code in ["LATER", "GONE", "NOPE"] {
    let err = shop.carts.apply_coupon(&key, code, now()).await.expect_err("invalid coupon");
    assert!(matches!(err, ShopError::InvalidCoupon(ref c) if c == code));
    assert_eq!(shop.carts.load(&key).await.expect("load").coupon_id(), None);
  }
}

#[tokio::test]
#[serial]
async fn test_inactive_coupon_is_rejected() {
  setup_tracing();
  let shop = shop();
  let mut disabled = coupon("OFF", dec!(20), None, None);
  disabled.active = false;
  shop.store.insert_coupon(disabled);
  let err = shop.carts.apply_coupon(&session(), "OFF", now()).await.expect_err("inactive");
  assert!(matches!(err, ShopError::InvalidCoupon(_)));
}

#[tokio::test]
#[serial]
async fn test_emptying_the_cart_drops_the_coupon() {
  setup_tracing();
  let shop = shop();
  let jam = product("Jam", dec!(3.50));
  shop.store.insert_product(jam.clone());
  shop.store.insert_coupon(coupon("JAM", dec!(5), None, None));
  let key = session();

  shop.carts.add(&key, jam.id, 1).await.expect("add");
  shop.carts.apply_coupon(&key, "JAM", now()).await.expect("apply");
  let cart = shop.carts.remove(&key, jam.id).await.expect("remove");
  assert!(cart.is_empty());
  assert_eq!(cart.coupon_id(), None);
}

#[tokio::test]
#[serial]
async fn test_remove_coupon_and_clear() {
  setup_tracing();
  let shop = shop();
  let jam = product("Jam", dec!(3.50));
  shop.store.insert_product(jam.clone());
  shop.store.insert_coupon(coupon("JAM", dec!(5), None, None));
  let key = session();

  shop.carts.add(&key, jam.id, 2).await.expect("add");
  shop.carts.apply_coupon(&key, "JAM", now()).await.expect("apply");
  let cart = shop.carts.remove_coupon(&key).await.expect("remove coupon");
  assert_eq!(cart.coupon_id(), None);
  assert_eq!(cart.total_quantity(), 2);

  shop.carts.clear(&key).await.expect("clear");
  assert!(shop.carts.load(&key).await.expect("load").is_empty());
  assert_eq!(shop.store.session_count(), 0);
}

#[tokio::test]
#[serial]
async fn test_sessions_do_not_share_carts() {
  setup_tracing();
  let shop = shop();
  let jam = product("Jam", dec!(3.50));
  shop.store.insert_product(jam.clone());
  let (a, b) = (session(), session());

  shop.carts.add(&a, jam.id, 3).await.expect("add");
  assert!(shop.carts.load(&b).await.expect("load").is_empty());
}

#[tokio::test]
#[serial]
async fn test_coupon_with_out_of_range_discount_is_rejected() {
  setup_tracing();
  let shop = shop();
  let apples = product("Apples", dec!(10.00));
  shop.store.insert_product(apples.clone());
  shop.store.insert_coupon(coupon("HUGE", dec!(150), None, None));
  let key = session();
  shop.carts.add(&key, apples.id, 2).await.expect("add");

  let err = shop.carts.apply_coupon(&key, "HUGE", now()).await.expect_err("over 100%");
  assert!(matches!(err, ShopError::InvalidCoupon(ref code) if code == "HUGE"));
  let summary = shop.carts.summary(&key, now()).await.expect("summary");
  assert_eq!(summary.coupon, None);
  assert_eq!(summary.total_after_discount, dec!(20.00));
}
