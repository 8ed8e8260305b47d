// larder/src/session.rs

//! Opaque per-client key/value persistence.

use crate::error::ShopResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one client session. Generated server-side and handed out in a cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
  pub fn generate() -> Self {
    SessionKey(Uuid::new_v4().simple().to_string())
  }

  /// Accepts keys previously produced by `generate`; anything else is rejected
  /// so that clients cannot pick arbitrary storage keys.
  pub fn parse(raw: &str) -> Option<Self> {
    Uuid::try_parse(raw).ok().map(|uuid| SessionKey(uuid.simple().to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SessionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
  async fn load(&self, key: &SessionKey) -> ShopResult<Option<Vec<u8>>>;

  async fn save(&self, key: &SessionKey, data: Vec<u8>) -> ShopResult<()>;

  async fn delete(&self, key: &SessionKey) -> ShopResult<()>;
}
