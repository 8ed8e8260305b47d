// larder/server/src/web/extractors.rs

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use futures_util::future::{ready, Ready};
use larder::{Customer, SessionKey};
use tracing::warn;
use uuid::Uuid;

const USER_HEADER: &str = "X-User-ID";

fn user_from_header(req: &HttpRequest) -> Option<Result<Uuid, AppError>> {
  let raw = req.headers().get(USER_HEADER)?;
  let parsed = raw
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or_else(|| {
      warn!("Invalid X-User-ID header.");
      AppError::Auth("Invalid X-User-ID header.".to_string())
    });
  Some(parsed)
}

/// Signed-in user. Identity comes from the `X-User-ID` header set by the
/// authenticating proxy in front of this service.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = match user_from_header(req) {
      Some(parsed) => parsed.map(|user_id| AuthenticatedUser { user_id }),
      None => {
        warn!("AuthenticatedUser extractor: Missing X-User-ID header.");
        Err(AppError::Auth("User authentication required.".to_string()))
      }
    };
    ready(result)
  }
}

/// Signed-in user if there is one; a malformed header is still an error.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Customer);

impl FromRequest for MaybeUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let result = match user_from_header(req) {
      Some(parsed) => parsed.map(|user_id| MaybeUser(Customer::User(user_id))),
      None => Ok(MaybeUser(Customer::Anonymous)),
    };
    ready(result)
  }
}

/// The cart session of the caller, read from the session cookie. A new key
/// is issued when the cookie is missing or was not produced by us.
#[derive(Debug, Clone)]
pub struct CartSession {
  pub key: SessionKey,
  is_new: bool,
  cookie_name: String,
}

impl CartSession {
  /// Sets the session cookie on `response` when the key was just issued.
  pub fn attach(&self, mut response: HttpResponse) -> Result<HttpResponse, AppError> {
    if self.is_new {
      let cookie = Cookie::build(self.cookie_name.clone(), self.key.as_str().to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
      response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(format!("Failed to set session cookie: {}", e)))?;
    }
    Ok(response)
  }
}

impl FromRequest for CartSession {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Internal("Application state is not configured.".to_string())));
    };
    let cookie_name = state.config.session_cookie_name.clone();
    let existing = req.cookie(&cookie_name).and_then(|c| SessionKey::parse(c.value()));
    let session = match existing {
      Some(key) => CartSession {
        key,
        is_new: false,
        cookie_name,
      },
      None => CartSession {
        key: SessionKey::generate(),
        is_new: true,
        cookie_name,
      },
    };
    ready(Ok(session))
  }
}
