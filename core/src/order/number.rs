// larder/src/order/number.rs

use super::store::OrderStore;
use crate::error::ShopResult;
use chrono::NaiveDate;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type DigitSource = Arc<dyn Fn() -> u32 + Send + Sync>;

/// Produces human-facing order numbers of the form `YYYY-MM-DD-NNNNNN`.
///
/// When the base number is already taken a second six-digit block is
/// appended. The store's uniqueness constraint remains the final authority.
#[derive(Clone)]
pub struct OrderNumberGenerator {
  digits: DigitSource,
}

impl OrderNumberGenerator {
  pub fn random() -> Self {
    Self {
      digits: Arc::new(|| rand::thread_rng().gen_range(0..1_000_000)),
    }
  }

  /// Uses `digits` instead of the thread RNG; values are reduced modulo 10^6.
  pub fn with_source(digits: impl Fn() -> u32 + Send + Sync + 'static) -> Self {
    Self {
      digits: Arc::new(digits),
    }
  }

  fn block(&self) -> String {
    format!("{:06}", (self.digits)() % 1_000_000)
  }

  pub fn base(&self, date: NaiveDate) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), self.block())
  }

  pub fn suffixed(&self, number: &str) -> String {
    format!("{}-{}", number, self.block())
  }

  /// Picks a number not known to `store` at the time of the check.
  pub async fn allocate(&self, store: &dyn OrderStore, date: NaiveDate) -> ShopResult<String> {
    let number = self.base(date);
    if !store.order_number_exists(&number).await? {
      return Ok(number);
    }
    debug!(%number, "Order number taken, appending suffix.");
    Ok(self.suffixed(&number))
  }
}

impl Default for OrderNumberGenerator {
  fn default() -> Self {
    Self::random()
  }
}

impl fmt::Debug for OrderNumberGenerator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OrderNumberGenerator").finish_non_exhaustive()
  }
}
