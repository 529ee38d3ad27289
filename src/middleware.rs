//! Cross-cutting request layers.

pub mod auth;
pub mod rate_limit;
pub mod recover;
pub mod request_id;

pub use auth::{basic_auth, jwt_auth, require_admin, AuthUser};
pub use rate_limit::rate_limit;
pub use recover::handle_panic;
pub use request_id::{request_id, REQUEST_ID_HEADER};
