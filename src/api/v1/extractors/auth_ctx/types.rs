/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 * - ここは「型（契約）」として固定化する
 */
use crate::services::auth::Claims;

/// Context attached to a request that passed the authorization guard.
///
/// Built only from verified [`Claims`]; there is no other constructor path.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    /// Token subject (opaque identity-provider id, e.g. `auth0|...`).
    pub sub: String,
    /// Permissions granted by the token. Empty when the claims carried none
    /// (only reachable through public-permission guards).
    pub permissions: Vec<String>,
}

impl AuthCtx {
    pub fn new(claims: &Claims) -> Self {
        Self {
            sub: claims.sub.clone(),
            permissions: claims.permissions.clone().unwrap_or_default(),
        }
    }
}
