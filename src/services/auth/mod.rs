/*
 * Responsibility
 * - 認可フローの合成: header 抽出 → 鍵取得 → 署名検証 → permission チェック
 * - middleware から見える唯一の入口 (Authenticator::authorize)
 *
 * Public API:
 * - Authenticator, AuthError, Claims
 */
pub mod error;
pub mod jwks;
pub mod permissions;
pub mod token;
pub mod verify;

use axum::http::HeaderMap;

pub use error::AuthError;
pub use verify::Claims;

use jwks::JwksClient;
use verify::VerifierConfig;

/// Request-scoped authorization check against the remote key set.
///
/// One instance lives in `AppState`; the key set cache inside `JwksClient`
/// is the only state shared between requests.
#[derive(Debug)]
pub struct Authenticator {
    jwks: JwksClient,
    config: VerifierConfig,
}

impl Authenticator {
    pub fn new(jwks: JwksClient, config: VerifierConfig) -> Self {
        Self { jwks, config }
    }

    /// Run the full check and hand back the verified claims.
    ///
    /// Short-circuits on the first failure and never translates errors;
    /// the boundary maps `AuthError` onto the wire. Header extraction runs
    /// before any network I/O, so a request without credentials never
    /// triggers a key set fetch.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        required_permission: &str,
    ) -> Result<Claims, AuthError> {
        let token = token::bearer_token(headers)?;
        let kid = verify::token_kid(token)?;
        let key = self.jwks.key_for(&kid).await?;
        let claims = verify::verify(token, &key, &self.config)?;
        permissions::check(required_permission, &claims)?;

        Ok(claims)
    }
}
