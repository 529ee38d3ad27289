//! Ownership rules shared by every owner-scoped resource.
//!
//! A non-admin caller that does not own a row gets the same not-found error
//! as for a row that does not exist.

use crate::error::{ApiError, ApiResult};

/// Passes for admins and for the owner; otherwise fails with `not_found`.
///
/// `requester_id` is `None` when the caller has no key to compare with, for
/// example a product check for a user without a shop.
pub fn ensure_owner(
    owner_id: i32,
    requester_id: Option<i32>,
    is_admin: bool,
    not_found: &str,
) -> ApiResult<()> {
    if is_admin || requester_id == Some(owner_id) {
        Ok(())
    } else {
        Err(ApiError::not_found(not_found))
    }
}

/// Owner filter for list queries: `None` lets admins see every row.
pub fn owner_scope(requester_id: i32, is_admin: bool) -> Option<i32> {
    (!is_admin).then_some(requester_id)
}
