pub mod addresses;
pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod provcity;
pub mod shops;
pub mod trx;
pub mod users;

use axum::Json;
use common::ApiResponse;

pub const POST_SUCCEEDED: &str = "Succeed to POST data";
pub const GET_SUCCEEDED: &str = "Succeed to GET data";
pub const PUT_SUCCEEDED: &str = "Succeed to PUT data";
pub const DELETE_SUCCEEDED: &str = "Succeed to DELETE data";

/// Wraps `data` in a success envelope.
pub fn respond<T>(message: &str, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(message, data))
}
