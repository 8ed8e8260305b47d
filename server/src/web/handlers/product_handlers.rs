// larder/server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use larder::Product;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductView {
  #[serde(flatten)]
  pub product: Product,
  pub final_price: Decimal,
  pub in_stock: bool,
}

impl From<Product> for ProductView {
  fn from(product: Product) -> Self {
    ProductView {
      final_price: product.final_price(),
      in_stock: product.in_stock(),
      product,
    }
  }
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products: Vec<ProductView> = app_state
    .catalog
    .list_products()
    .await?
    .into_iter()
    .map(ProductView::from)
    .collect();
  info!("Successfully fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[instrument(name = "handler::get_product", skip(app_state))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.get_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "product": ProductView::from(product) })))
}
