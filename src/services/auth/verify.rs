//! RS256 signature verification and standard-claims validation.
//!
//! Responsibility:
//! - Read the unverified token header to learn which signing key to use.
//! - Verify signature + iss/aud/exp against the configured issuer/audience
//!   with the algorithm pinned to RS256.
//!
//! Notes:
//! - Claims are only ever produced by a successful `decode`; nothing in this
//!   module hands out payload data from an unverified token.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;

use crate::services::auth::{error::AuthError, jwks::Jwk};

/// Issuer/audience the token must be bound to. Built once from `Config`.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub issuer: String,
    pub audience: String,
}

/// Verified token payload. The only trusted output of the auth core.
///
/// `aud` is kept as a raw value because providers emit either a string or an
/// array; `jsonwebtoken` checks it against the configured audience either way.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    pub iss: String,
    #[serde(default)]
    pub aud: serde_json::Value,
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Extract the key id from the (unverified) token header.
///
/// The kid only selects which key to verify with; it grants nothing by
/// itself.
pub fn token_kid(token: &str) -> Result<String, AuthError> {
    let header = jsonwebtoken::decode_header(token).map_err(|_| AuthError::InvalidToken)?;

    header
        .kid
        .filter(|kid| !kid.is_empty())
        .ok_or(AuthError::UntrustedKeyId)
}

/// Verify `token` against one selected key.
///
/// Expiry is the one failure a client may distinguish; every other signature
/// or claims problem folds into `InvalidToken`.
pub fn verify(token: &str, key: &Jwk, config: &VerifierConfig) -> Result<Claims, AuthError> {
    let decoding_key =
        DecodingKey::from_rsa_components(&key.n, &key.e).map_err(|_| AuthError::InvalidToken)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);

    let data = jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    })?;

    Ok(data.claims)
}
