// larder/src/payment/webhook.rs

use crate::error::{ShopError, ShopResult};
use crate::order::OrderId;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// What a verified webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
  Paid(OrderId),
  /// Repeat delivery for an order already marked paid.
  AlreadyPaid(OrderId),
  /// Event type we do not act upon.
  Ignored(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
  pub object: Value,
}

impl WebhookEvent {
  pub fn parse(payload: &[u8]) -> ShopResult<Self> {
    serde_json::from_slice(payload).map_err(|e| ShopError::Validation(format!("malformed webhook payload: {e}")))
  }

  /// Order referenced by a checkout session, taken from
  /// `client_reference_id` or else `metadata.order_id`.
  pub fn order_id(&self) -> ShopResult<OrderId> {
    let object = &self.data.object;
    let raw = object
      .get("client_reference_id")
      .and_then(Value::as_str)
      .or_else(|| object.pointer("/metadata/order_id").and_then(Value::as_str))
      .ok_or_else(|| ShopError::Validation("webhook event does not reference an order".into()))?;
    OrderId::parse_str(raw).map_err(|_| ShopError::Validation(format!("invalid order id '{raw}' in webhook event")))
  }
}

/// Checks `t=<unix>,v1=<hex>` signature headers: HMAC-SHA256 over
/// `"{t}.{payload}"` keyed with the shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
  secret: Vec<u8>,
  tolerance: Duration,
}

impl WebhookVerifier {
  pub fn new(secret: impl Into<Vec<u8>>) -> Self {
    Self {
      secret: secret.into(),
      tolerance: DEFAULT_TOLERANCE,
    }
  }

  pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
    self.tolerance = tolerance;
    self
  }

  fn mac(&self, timestamp: i64, payload: &[u8]) -> ShopResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(&self.secret)
      .map_err(|e| ShopError::InvalidSignature(format!("unusable webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
  }

  /// Produces a header value for `payload` at `timestamp`.
  pub fn sign(&self, payload: &[u8], timestamp: i64) -> ShopResult<String> {
    let signature = self.mac(timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
  }

  /// Accepts the header if any `v1` entry matches and `t` lies within the
  /// tolerance around `now` (unix seconds).
  pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> ShopResult<()> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
      match part.trim().split_once('=') {
        Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
        Some(("v1", value)) => candidates.push(value),
        _ => {}
      }
    }

    let timestamp = timestamp.ok_or_else(|| ShopError::InvalidSignature("missing timestamp".into()))?;
    if candidates.is_empty() {
      return Err(ShopError::InvalidSignature("missing v1 signature".into()));
    }
    if now.abs_diff(timestamp) > self.tolerance.as_secs() {
      return Err(ShopError::InvalidSignature("timestamp outside tolerance".into()));
    }

    for candidate in candidates {
      let Ok(signature) = hex::decode(candidate) else {
        continue;
      };
      if self.mac(timestamp, payload)?.verify_slice(&signature).is_ok() {
        return Ok(());
      }
    }
    Err(ShopError::InvalidSignature("no matching signature".into()))
  }
}

impl std::fmt::Debug for WebhookVerifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WebhookVerifier")
      .field("secret", &"[REDACTED]")
      .field("tolerance", &self.tolerance)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const NOW: i64 = 1_780_000_000;

  fn verifier() -> WebhookVerifier {
    WebhookVerifier::new("whsec_test")
  }

  #[test]
  fn accepts_its_own_signature() {
    let payload = br#"{"type":"checkout.session.completed"}"#;
    let header = verifier().sign(payload, NOW).expect("sign");
    assert!(verifier().verify(payload, &header, NOW + 10).is_ok());
  }

  #[test]
  fn rejects_tampered_payload_and_wrong_secret() {
    let header = verifier().sign(b"original", NOW).expect("sign");
    assert!(matches!(
      verifier().verify(b"tampered", &header, NOW),
      Err(ShopError::InvalidSignature(_))
    ));
    let other = WebhookVerifier::new("whsec_other");
    assert!(other.verify(b"original", &header, NOW).is_err());
  }

  #[test]
  fn rejects_stale_timestamps() {
    let header = verifier().sign(b"{}", NOW).expect("sign");
    assert!(verifier().verify(b"{}", &header, NOW + 300).is_ok());
    assert!(verifier().verify(b"{}", &header, NOW + 301).is_err());
    assert!(verifier().verify(b"{}", &header, NOW - 301).is_err());
  }

  #[test]
  fn any_matching_v1_entry_is_enough() {
    let signed = verifier().sign(b"{}", NOW).expect("sign");
    let good = signed.split_once("v1=").map(|(_, sig)| sig.to_string()).expect("v1 part");
    let header = format!("t={NOW},v1=deadbeef,v0=ignored,v1={good}");
    assert!(verifier().verify(b"{}", &header, NOW).is_ok());
  }

  #[test]
  fn malformed_headers_are_rejected() {
    let only_timestamp = format!("t={NOW}");
    for header in ["", "v1=abcd", "t=now,v1=abcd", only_timestamp.as_str()] {
      assert!(matches!(
        verifier().verify(b"{}", header, NOW),
        Err(ShopError::InvalidSignature(_))
      ));
    }
  }

  #[test]
  fn order_id_comes_from_reference_or_metadata() {
    let id = OrderId::new_v4();
    let by_ref = format!(r#"{{"type":"{CHECKOUT_COMPLETED}","data":{{"object":{{"client_reference_id":"{id}"}}}}}}"#);
    assert_eq!(WebhookEvent::parse(by_ref.as_bytes()).and_then(|e| e.order_id()).ok(), Some(id));

    let by_meta = format!(r#"{{"type":"{CHECKOUT_COMPLETED}","data":{{"object":{{"metadata":{{"order_id":"{id}"}}}}}}}}"#);
    assert_eq!(WebhookEvent::parse(by_meta.as_bytes()).and_then(|e| e.order_id()).ok(), Some(id));

    let none = r#"{"type":"checkout.session.completed","data":{"object":{}}}"#;
    assert!(WebhookEvent::parse(none.as_bytes()).and_then(|e| e.order_id()).is_err());
  }
}
