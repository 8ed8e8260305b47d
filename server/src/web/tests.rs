// larder/server/src/web/tests.rs

use crate::config::AppConfig;
use crate::services::MockGateway;
use crate::state::AppState;
use crate::web::configure_app_routes;
use crate::web::handlers::webhook_handlers::SIGNATURE_HEADER;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::Utc;
use larder::memory::MemoryStore;
use larder::{Coupon, Product, WebhookVerifier};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn fixture() -> (AppState, Arc<MemoryStore>) {
  let store = Arc::new(MemoryStore::new());
  let config = Arc::new(AppConfig::for_tests());
  let gateway = Arc::new(MockGateway::new(config.app_base_url.clone()).with_latency(Duration::ZERO));
  (AppState::new(store.clone(), gateway, config), store)
}

fn honey(store: &MemoryStore) -> Product {
  let product = Product {
    id: Uuid::new_v4(),
    name: "Honey".to_string(),
    price: dec!(12.50),
    discount: Decimal::ZERO,
    amount: 40,
    unit: "jar".to_string(),
    times_ordered: 0,
  };
  store.insert_product(product.clone());
  product
}

fn decimal(value: &Value) -> Decimal {
  value.as_str().expect("decimal serialized as string").parse().expect("decimal")
}

fn session_cookie(resp: &actix_web::dev::ServiceResponse) -> Cookie<'static> {
  resp
    .response()
    .cookies()
    .find(|c| c.name() == "larder_session")
    .expect("session cookie issued")
    .into_owned()
}

#[actix_web::test]
async fn health_reports_ok() {
  let (state, _store) = fixture();
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn products_expose_final_price() {
  let (state, store) = fixture();
  let mut product = honey(&store);
  product.id = Uuid::new_v4();
  product.discount = dec!(20);
  store.insert_product(product.clone());
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::get().uri(&format!("/api/v1/products/{}", product.id)).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(decimal(&body["product"]["final_price"]), dec!(10.00));

  let req = test::TestRequest::get().uri(&format!("/api/v1/products/{}", Uuid::new_v4())).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn cart_is_kept_per_session_cookie() {
  let (state, store) = fixture();
  let product = honey(&store);
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 2 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let cookie = session_cookie(&resp);

  let req = test::TestRequest::get().uri("/api/v1/cart").cookie(cookie.clone()).to_request();
  let resp = test::call_service(&app, req).await;
  assert!(resp.response().cookies().next().is_none(), "known session keeps its cookie");
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["cart"]["total_quantity"], 2);
  assert_eq!(decimal(&body["cart"]["total_price"]), dec!(25.00));

  // A fresh client sees an empty cart.
  let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/v1/cart").to_request()).await;
  assert_eq!(body["cart"]["total_quantity"], 0);

  let req = test::TestRequest::patch()
    .uri(&format!("/api/v1/cart/items/{}", product.id))
    .cookie(cookie.clone())
    .set_json(json!({ "quantity": 0 }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["cart"]["lines"].as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn invalid_quantity_and_unknown_line_are_client_errors() {
  let (state, store) = fixture();
  let product = honey(&store);
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 0 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["kind"], "invalid_quantity");

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/cart/items/{}", product.id))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn invalid_coupon_is_rejected() {
  let (state, store) = fixture();
  let product = honey(&store);
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 1 }))
    .to_request();
  let cookie = session_cookie(&test::call_service(&app, req).await);

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/coupon")
    .cookie(cookie)
    .set_json(json!({ "code": "NOPE" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["kind"], "invalid_coupon");
}

#[actix_web::test]
async fn checkout_with_coupon_then_signed_webhook_marks_paid() {
  let (state, store) = fixture();
  let product = honey(&store);
  store.insert_coupon(Coupon {
    id: Uuid::new_v4(),
    code: "SPRING10".to_string(),
    discount: dec!(10),
    active: true,
    start_time: None,
    end_time: None,
  });
  let verifier = WebhookVerifier::new(state.config.stripe_webhook_secret.as_bytes());
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;
  let user = Uuid::new_v4().to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 2 }))
    .to_request();
  let cookie = session_cookie(&test::call_service(&app, req).await);

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/coupon")
    .cookie(cookie.clone())
    .set_json(json!({ "code": "spring10" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(decimal(&body["cart"]["discount_amount"]), dec!(2.50));
  assert_eq!(decimal(&body["cart"]["total_price"]), dec!(25.00));

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .cookie(cookie.clone())
    .insert_header(("X-User-ID", user.as_str()))
    .set_json(json!({ "payment_method": "card", "delivery_method": "pickup_point" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let order_id = body["order"]["id"].as_str().expect("order id").to_string();
  assert_eq!(decimal(&body["order"]["total_price"]), dec!(22.50));
  assert_eq!(body["order"]["paid"], false);
  assert!(body["payment_url"].as_str().is_some_and(|url| url.ends_with(&order_id)));

  // The cart was emptied by the checkout.
  let req = test::TestRequest::get().uri("/api/v1/cart").cookie(cookie).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["cart"]["total_quantity"], 0);

  let payload = json!({
      "id": "evt_1",
      "type": "checkout.session.completed",
      "data": { "object": { "id": "cs_1", "client_reference_id": order_id, "payment_status": "paid" } }
  })
  .to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/payments")
    .insert_header((SIGNATURE_HEADER, "t=1,v1=deadbeef"))
    .set_payload(payload.clone())
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", user.as_str()))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["order"]["paid"], false, "rejected webhook changes nothing");

  let header = verifier.sign(payload.as_bytes(), Utc::now().timestamp()).expect("sign");
  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/payments")
    .insert_header((SIGNATURE_HEADER, header.as_str()))
    .set_payload(payload.clone())
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "paid");

  let req = test::TestRequest::post()
    .uri("/api/v1/webhooks/payments")
    .insert_header((SIGNATURE_HEADER, header.as_str()))
    .set_payload(payload)
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "already_paid");

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/pay", order_id))
    .insert_header(("X-User-ID", user.as_str()))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn anonymous_checkout_validates_methods_and_contact() {
  let (state, store) = fixture();
  let product = honey(&store);
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 1 }))
    .to_request();
  let cookie = session_cookie(&test::call_service(&app, req).await);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .cookie(cookie.clone())
    .set_json(json!({ "payment_method": "cash_on_courier", "delivery_method": "pickup_point" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["kind"], "incompatible_payment_delivery");

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .cookie(cookie.clone())
    .set_json(json!({
        "payment_method": "cash_on_courier",
        "delivery_method": "courier",
        "delivery": { "kind": "text", "address": "12 Orchard Lane" },
        "packaging": true,
        "contact": { "first_name": "Ada", "last_name": "Byron", "phone": "+1 555-0100", "email": "ada@example.com" }
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(decimal(&body["order"]["total_price"]), dec!(14.00));
  assert!(body["payment_url"].is_null());
  assert_eq!(store.order_count(), 1);

  let req = test::TestRequest::post().uri("/api/v1/checkout").cookie(cookie).set_json(json!({
      "payment_method": "card",
      "delivery_method": "pickup_point"
  }));
  let resp = test::call_service(&app, req.to_request()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["kind"], "empty_cart");
}

#[actix_web::test]
async fn orders_require_a_user_and_respect_ownership() {
  let (state, store) = fixture();
  let product = honey(&store);
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;
  let owner = Uuid::new_v4().to_string();
  let stranger = Uuid::new_v4().to_string();

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/orders").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 3 }))
    .to_request();
  let cookie = session_cookie(&test::call_service(&app, req).await);
  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .cookie(cookie)
    .insert_header(("X-User-ID", owner.as_str()))
    .set_json(json!({ "payment_method": "pickup_point_payment", "delivery_method": "pickup_point" }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  let order_id = body["order"]["id"].as_str().expect("order id").to_string();

  let req = test::TestRequest::get()
    .uri("/api/v1/orders")
    .insert_header(("X-User-ID", owner.as_str()))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["orders"].as_array().map(Vec::len), Some(1));

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", stranger.as_str()))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::delete()
    .uri(&format!("/api/v1/orders/{}", order_id))
    .insert_header(("X-User-ID", owner.as_str()))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  assert_eq!(store.order_count(), 0);
}

#[actix_web::test]
async fn fully_discounted_card_order_is_paid_at_checkout() {
  let (state, store) = fixture();
  let product = honey(&store);
  store.insert_coupon(Coupon {
    id: Uuid::new_v4(),
    code: "FREE".to_string(),
    discount: dec!(100),
    active: true,
    start_time: None,
    end_time: None,
  });
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;
  let user = Uuid::new_v4().to_string();

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 1 }))
    .to_request();
  let cookie = session_cookie(&test::call_service(&app, req).await);
  let req = test::TestRequest::post()
    .uri("/api/v1/cart/coupon")
    .cookie(cookie.clone())
    .set_json(json!({ "code": "FREE" }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .cookie(cookie)
    .insert_header(("X-User-ID", user.as_str()))
    .set_json(json!({ "payment_method": "card", "delivery_method": "pickup_point" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(decimal(&body["order"]["total_price"]), dec!(0.00));
  assert_eq!(body["order"]["paid"], true);
  assert!(body["payment_url"].is_null());
  assert!(body["payment_error"].is_null());

  let order_id = body["order"]["id"].as_str().expect("order id").to_string();
  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/pay", order_id))
    .insert_header(("X-User-ID", user.as_str()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn guest_pays_from_the_session_that_placed_the_order() {
  let (state, store) = fixture();
  let product = honey(&store);
  let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure_app_routes)).await;

  let req = test::TestRequest::post()
    .uri("/api/v1/cart/items")
    .set_json(json!({ "product_id": product.id, "quantity": 1 }))
    .to_request();
  let cookie = session_cookie(&test::call_service(&app, req).await);
  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .cookie(cookie.clone())
    .set_json(json!({
        "payment_method": "card",
        "delivery_method": "pickup_point",
        "contact": { "first_name": "Ada", "last_name": "Byron", "phone": "+1 555-0100", "email": "ada@example.com" }
    }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  let order_id = body["order"]["id"].as_str().expect("order id").to_string();
  assert!(body["order"].get("guest_session").is_none(), "session key stays server-side");

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/pay", order_id))
    .cookie(cookie)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["payment_url"].as_str().is_some_and(|url| url.ends_with(&order_id)));

  // Another browser, or one that lost the cookie, cannot pay it.
  let req = test::TestRequest::post().uri(&format!("/api/v1/orders/{}/pay", order_id)).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri(&format!("/api/v1/orders/{}/pay", order_id))
    .insert_header(("X-User-ID", Uuid::new_v4().to_string()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}
