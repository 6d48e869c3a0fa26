//! Remote signing-key set (JWKS) retrieval and caching.
//!
//! Responsibility:
//! - Fetch `https://<domain>/.well-known/jwks.json` with a bounded timeout.
//! - Keep a process-wide kid → key cache and refresh it when a token names
//!   a kid we do not have yet (key rotation), with a cooldown so a flood of
//!   unknown kids cannot hammer the identity provider.
//!
//! Notes:
//! - The cache is replaced wholesale under the write lock; readers never see
//!   a partially applied key set.
//! - Selection is exact-match on `kid` only. A miss is a miss — there is no
//!   default key to fall back to.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::services::auth::error::AuthError;

/// One RSA signing key as published by the identity provider.
///
/// Deserialization is strict: an entry missing any of these fields does not
/// parse and is dropped from the set, so it can never be selected.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub use_: String,
    /// RSA modulus, base64url.
    pub n: String,
    /// RSA public exponent, base64url.
    pub e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSetDocument {
    keys: Vec<serde_json::Value>,
}

/// Keep only entries that carry all required fields and describe an RSA
/// signature key.
fn index_keys(doc: JwkSetDocument) -> HashMap<String, Jwk> {
    doc.keys
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<Jwk>(entry).ok())
        .filter(|key| key.kty == "RSA" && key.use_ == "sig")
        .map(|key| (key.kid.clone(), key))
        .collect()
}

#[derive(Debug, Default)]
struct Cache {
    keys: HashMap<String, Jwk>,
    fetched_at: Option<Instant>,
}

/// Cached client for the identity provider's published key set.
#[derive(Debug)]
pub struct JwksClient {
    http: reqwest::Client,
    jwks_url: String,
    refresh_cooldown: Duration,
    cache: RwLock<Cache>,
}

impl JwksClient {
    pub fn new(
        jwks_url: String,
        http_timeout: Duration,
        refresh_cooldown: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(http_timeout).build()?;

        Ok(Self {
            http,
            jwks_url,
            refresh_cooldown,
            cache: RwLock::new(Cache::default()),
        })
    }

    /// Look up the signing key for `kid`, refreshing the cached set at most
    /// once if the kid is unknown and the cooldown has passed.
    pub async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(key) = self.cache.read().await.keys.get(kid) {
            return Ok(key.clone());
        }

        // The write lock serializes refreshes: concurrent callers queue here
        // and re-check before fetching, so at most one fetch is in flight.
        let mut cache = self.cache.write().await;
        if let Some(key) = cache.keys.get(kid) {
            return Ok(key.clone());
        }

        let within_cooldown = cache
            .fetched_at
            .is_some_and(|at| at.elapsed() < self.refresh_cooldown);

        if !within_cooldown {
            cache.keys = self.fetch().await?;
            cache.fetched_at = Some(Instant::now());
        }

        cache
            .keys
            .get(kid)
            .cloned()
            .ok_or(AuthError::UnknownSigningKey)
    }

    async fn fetch(&self) -> Result<HashMap<String, Jwk>, AuthError> {
        let doc = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| {
                tracing::warn!(error = %e, url = %self.jwks_url, "jwks fetch failed");
                AuthError::KeySetUnavailable
            })?
            .json::<JwkSetDocument>()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, url = %self.jwks_url, "jwks decode failed");
                AuthError::KeySetUnavailable
            })?;

        let keys = index_keys(doc);
        tracing::debug!(count = keys.len(), "signing key set refreshed");
        Ok(keys)
    }
}
