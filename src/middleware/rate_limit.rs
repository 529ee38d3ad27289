use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::schemas::AppState;

pub const RATE_LIMITED_MESSAGE: &str = "Too many request";

/// Process-wide token bucket shared by every client.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> ApiResult<Response> {
    if state.rate_limiter.check().is_err() {
        debug!(path = %request.uri().path(), "rate limit exceeded");
        return Err(ApiError::warn(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE));
    }
    Ok(next.run(request).await)
}
