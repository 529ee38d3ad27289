//! Basic auth for the credential endpoints, JWT for everything else.

use std::fmt;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::error::{ApiError, ApiResult};
use crate::schemas::AppState;
use crate::services::auth::{decode_token, is_revoked};

pub const ADMIN_REQUIRED: &str = "Admin access required";

/// The caller behind a verified token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub is_admin: bool,
    pub token: String,
    /// Token expiry, unix seconds.
    pub expires: i64,
}

// Handlers record their arguments on spans; keep the raw token out of logs.
impl fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUser")
            .field("id", &self.id)
            .field("is_admin", &self.is_admin)
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

/// `Bearer <token>` or the bare token.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = authorization(headers)?;
    let token = match raw.split_once(' ') {
        Some(("Bearer", rest)) => rest.trim(),
        _ if raw == "Bearer" => "",
        _ => raw,
    };
    (!token.is_empty()).then_some(token)
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = authorization(headers)?.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Compares SHA-256 digests so the timing does not depend on where the
/// inputs first differ.
fn digest_eq(a: &str, b: &str) -> bool {
    let left = Sha256::digest(a.as_bytes());
    let right = Sha256::digest(b.as_bytes());
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

pub async fn basic_auth(State(state): State<AppState>, request: Request, next: Next) -> ApiResult<Response> {
    let expected = &state.config.auth.basic;
    let Some((username, password)) = basic_credentials(request.headers()) else {
        debug!("missing or malformed basic credentials");
        return Err(ApiError::unauthorized());
    };

    let user_ok = digest_eq(&username, &expected.username);
    let pass_ok = digest_eq(&password, &expected.password);
    if !(user_ok && pass_ok) {
        warn!("basic credentials rejected");
        return Err(ApiError::unauthorized());
    }
    Ok(next.run(request).await)
}

/// Verifies the token, refuses revoked ones and stores an [`AuthUser`] in the
/// request extensions.
pub async fn jwt_auth(State(state): State<AppState>, mut request: Request, next: Next) -> ApiResult<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(ApiError::unauthorized)?
        .to_string();

    let claims = decode_token(&state.config.auth.jwt, &token)?;
    if is_revoked(&state.db, &token).await? {
        debug!(user_id = claims.id, "revoked token presented");
        return Err(ApiError::unauthorized());
    }

    trace!(user_id = claims.id, "token accepted");
    request.extensions_mut().insert(AuthUser {
        id: claims.id,
        is_admin: claims.is_admin,
        token,
        expires: claims.exp,
    });
    Ok(next.run(request).await)
}

/// Must sit inside [`jwt_auth`].
pub async fn require_admin(request: Request, next: Next) -> ApiResult<Response> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        Some(user) => {
            debug!(user_id = user.id, "admin route refused");
            Err(ApiError::forbidden(ADMIN_REQUIRED))
        }
        None => Err(ApiError::unauthorized()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn basic_header_is_decoded() {
        let encoded = STANDARD.encode("admin:s3cret:with-colon");
        assert_eq!(
            basic_credentials(&headers(&format!("Basic {encoded}"))),
            Some(("admin".to_string(), "s3cret:with-colon".to_string()))
        );
        assert_eq!(basic_credentials(&headers("Basic !!!")), None);
        assert_eq!(basic_credentials(&headers("Bearer x")), None);
    }

    #[test]
    fn digest_comparison() {
        assert!(digest_eq("evermos", "evermos"));
        assert!(!digest_eq("evermos", "evermo"));
        assert!(!digest_eq("", "x"));
    }
}
