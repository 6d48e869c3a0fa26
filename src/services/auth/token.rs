/*
 * Responsibility
 * - Authorization ヘッダから bearer token を取り出す (純粋関数、I/O なし)
 * - scheme / 形式の検査のみ。token 自体のパースは verify 側の責務
 */
use axum::http::{HeaderMap, header};

use crate::services::auth::error::AuthError;

/// Pull the bearer token out of the request headers.
///
/// Accepts exactly `Bearer <token>` (scheme compared case-insensitively,
/// single space, no extra parts) and returns the token verbatim.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?;

    // A header that is not valid UTF-8 cannot carry a compact JWT.
    let value = value.to_str().map_err(|_| AuthError::MalformedAuthHeader)?;

    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 {
        return Err(AuthError::MalformedAuthHeader);
    }
    if !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedAuthHeader);
    }

    Ok(parts[1])
}
