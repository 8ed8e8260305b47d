// larder/server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

const MOCK_WEBHOOK_SECRET: &str = "whsec_mock_local_only";

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,

  pub packaging_fee: Decimal,
  pub session_cookie_name: String,

  /// `None` selects the mock payment gateway.
  pub stripe_secret_key: Option<String>,
  pub stripe_webhook_secret: String,
  pub stripe_api_base: String,
  pub currency: String,

  pub run_migrations: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let optional = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let packaging_fee = Decimal::from_str(&get_env("PACKAGING_FEE").unwrap_or_else(|_| "0.00".to_string()))
      .map_err(|e| AppError::Config(format!("Invalid PACKAGING_FEE: {}", e)))?;
    if packaging_fee.is_sign_negative() {
      return Err(AppError::Config("PACKAGING_FEE must not be negative".to_string()));
    }
    let session_cookie_name = get_env("SESSION_COOKIE_NAME").unwrap_or_else(|_| "larder_session".to_string());

    let stripe_secret_key = optional("STRIPE_SECRET_KEY");
    let stripe_webhook_secret = match (optional("STRIPE_WEBHOOK_SECRET"), &stripe_secret_key) {
      (Some(secret), _) => secret,
      (None, Some(_)) => {
        return Err(AppError::Config(
          "STRIPE_WEBHOOK_SECRET is required when STRIPE_SECRET_KEY is set".to_string(),
        ))
      }
      (None, None) => MOCK_WEBHOOK_SECRET.to_string(),
    };
    let stripe_api_base = get_env("STRIPE_API_BASE").unwrap_or_else(|_| "https://api.stripe.com".to_string());
    let currency = get_env("CURRENCY").unwrap_or_else(|_| "usd".to_string()).to_lowercase();

    let run_migrations = get_env("RUN_MIGRATIONS")
      .unwrap_or_else(|_| "true".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid RUN_MIGRATIONS value: {}", e)))?;

    tracing::info!(
      gateway = if stripe_secret_key.is_some() { "stripe" } else { "mock" },
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      packaging_fee,
      session_cookie_name,
      stripe_secret_key,
      stripe_webhook_secret,
      stripe_api_base,
      currency,
      run_migrations,
    })
  }
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("app_base_url", &self.app_base_url)
      .field("packaging_fee", &self.packaging_fee)
      .field("session_cookie_name", &self.session_cookie_name)
      .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "[REDACTED]"))
      .field("stripe_api_base", &self.stripe_api_base)
      .field("currency", &self.currency)
      .field("run_migrations", &self.run_migrations)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
impl AppConfig {
  pub fn for_tests() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: String::new(),
      app_base_url: "http://shop.test".to_string(),
      packaging_fee: Decimal::new(150, 2),
      session_cookie_name: "larder_session".to_string(),
      stripe_secret_key: None,
      stripe_webhook_secret: MOCK_WEBHOOK_SECRET.to_string(),
      stripe_api_base: "http://stripe.invalid".to_string(),
      currency: "usd".to_string(),
      run_migrations: false,
    }
  }
}
