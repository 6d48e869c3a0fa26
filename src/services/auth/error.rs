/*
 * Responsibility
 * - 認可フロー全体の失敗の分類 (AuthError)
 * - 各 variant が HTTP status と wire 上の message を一意に決める
 */
use axum::http::StatusCode;
use thiserror::Error;

/// Every failure the authorization core can produce, one variant per cause.
///
/// The split is deliberately finer than what the wire exposes: most 401
/// variants share one generic message so a caller cannot probe which check
/// failed. Only expiry gets a distinguishable message, and the two 403
/// variants share the permission-denied message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthHeader,
    #[error("authorization header malformed")]
    MalformedAuthHeader,
    #[error("signing key set unavailable")]
    KeySetUnavailable,
    #[error("token header carries no key id")]
    UntrustedKeyId,
    #[error("no signing key matches the token key id")]
    UnknownSigningKey,
    #[error("token expired")]
    TokenExpired,
    #[error("token verification failed")]
    InvalidToken,
    #[error("claims carry no permissions list")]
    NoPermissionsClaim,
    #[error("required permission not granted")]
    PermissionDenied,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthHeader
            | Self::MalformedAuthHeader
            | Self::KeySetUnavailable
            | Self::UntrustedKeyId
            | Self::UnknownSigningKey
            | Self::TokenExpired
            | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::NoPermissionsClaim | Self::PermissionDenied => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message. Keep this coarse: only expiry is allowed to
    /// stand out from the generic unauthorized message.
    pub fn description(&self) -> &'static str {
        match self {
            Self::TokenExpired => "Unauthorised. The token expired.",
            Self::NoPermissionsClaim | Self::PermissionDenied => {
                "You do not have permission to perform that action."
            }
            _ => "Unauthorised.",
        }
    }
}
