/*
 * Responsibility
 * - 検証済み Claims に対する RBAC チェック (exact string match)
 * - required が空なら public 扱いで skip
 */
use crate::services::auth::{error::AuthError, verify::Claims};

/// Check that the verified claims grant `required`.
///
/// An empty `required` means the operation is public and the permissions
/// list is never inspected. A token without any permissions list is a
/// different failure than a token that denies this specific action; both
/// surface as 403.
pub fn check(required: &str, claims: &Claims) -> Result<(), AuthError> {
    if required.is_empty() {
        return Ok(());
    }

    let granted = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::NoPermissionsClaim)?;

    if granted.iter().any(|p| p == required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}
