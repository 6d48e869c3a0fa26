/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - db: PgPool, auth: Authenticator
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::Authenticator;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, auth: Arc<Authenticator>) -> Self {
        Self { db, auth }
    }
}
