// larder/server/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::PgStore;
use crate::services::{MockGateway, StripeGateway};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use larder::PaymentGateway;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  // LOG_FORMAT is read before AppConfig so that config loading itself is logged.
  dotenvy::dotenv().ok();
  let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

fn select_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
  match &config.stripe_secret_key {
    Some(secret_key) => {
      let gateway = StripeGateway::new(
        secret_key.clone(),
        config.stripe_api_base.clone(),
        config.currency.clone(),
        config.app_base_url.clone(),
      )?;
      Ok(Arc::new(gateway))
    }
    None => {
      tracing::warn!("STRIPE_SECRET_KEY is not set, using the mock payment gateway.");
      Ok(Arc::new(MockGateway::new(config.app_base_url.clone())))
    }
  }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  init_tracing();
  tracing::info!("Starting larder server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(io::Error::other(format!("Configuration error: {}", e)));
    }
  };
  tracing::debug!(config = ?app_config, "Effective configuration.");

  let db_pool = match PgPoolOptions::new().max_connections(10).connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(io::Error::other(format!("Database connection error: {}", e)));
    }
  };

  if app_config.run_migrations {
    if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
      tracing::error!(error = %e, "Database migrations failed.");
      return Err(io::Error::other(format!("Migration error: {}", e)));
    }
    tracing::info!("Database migrations applied.");
  }

  let gateway = select_gateway(&app_config).map_err(|e| {
    tracing::error!(error = %e, "Failed to initialise the payment gateway.");
    io::Error::other(format!("Payment gateway error: {}", e))
  })?;
  tracing::info!(gateway = gateway.name(), "Payment gateway ready.");

  let app_state = AppState::new(Arc::new(PgStore::new(db_pool)), gateway, app_config.clone());

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
