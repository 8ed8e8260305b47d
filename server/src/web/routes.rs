// larder/server/src/web/routes.rs

use actix_web::web;

use crate::errors::AppError;
use crate::web::handlers::{cart_handlers, checkout_handlers, order_handlers, product_handlers, webhook_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  // Malformed bodies get the same JSON error shape as domain errors.
  let json_config = web::JsonConfig::default()
    .error_handler(|err, _req| AppError::Validation(format!("Invalid request body: {}", err)).into());
  let path_config = web::PathConfig::default()
    .error_handler(|err, _req| AppError::Validation(format!("Invalid path parameter: {}", err)).into());

  cfg.app_data(json_config).app_data(path_config).service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/items/{product_id}", web::patch().to(cart_handlers::update_cart_item_handler))
          .route("/items/{product_id}", web::delete().to(cart_handlers::remove_cart_item_handler))
          .route("/coupon", web::post().to(cart_handlers::apply_coupon_handler))
          .route("/coupon", web::delete().to(cart_handlers::remove_coupon_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}", web::delete().to(order_handlers::delete_order_handler))
          .route("/{order_id}/pay", web::post().to(order_handlers::pay_order_handler)),
      )
      .service(
        web::scope("/webhooks").route("/payments", web::post().to(webhook_handlers::payment_webhook_handler)),
      ),
  );
}
