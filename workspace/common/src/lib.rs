//! Transport-layer types shared by the HTTP handlers, the services and the
//! integration tests: the response envelope, list filters, pagination and
//! the textual price codec.

mod filter;
mod pagination;
mod price;
mod slug;

pub use filter::{DateBounds, Filter, FilterError, ListQuery, SortOrder, DEFAULT_LIMIT, MAX_LIMIT};
pub use pagination::Paginated;
pub use price::{Price, PriceError};
pub use slug::slugify;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response envelope returned by every endpoint.
///
/// Successful calls carry `data` and `errors: null`; failed calls carry the
/// list of messages in `errors` and `data: null`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub status: bool,
    /// Short human readable summary
    pub message: String,
    /// Error details, `null` on success
    pub errors: Option<Vec<String>>,
    /// Response payload, `null` on failure
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            errors: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            errors: Some(errors),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_serializes_null_errors() {
        let body = serde_json::to_value(ApiResponse::success("Succeed to GET data", 5)).unwrap();
        assert_eq!(body["status"], true);
        assert_eq!(body["data"], 5);
        assert!(body["errors"].is_null());
    }

    #[test]
    fn failure_envelope_serializes_null_data() {
        let response: ApiResponse<()> =
            ApiResponse::failure("Failed to process request", vec!["boom".to_string()]);
        let body = serde_json::to_value(response).unwrap();
        assert_eq!(body["status"], false);
        assert_eq!(body["errors"][0], "boom");
        assert!(body["data"].is_null());
    }
}
