//! End-to-end tests for the authorization guard: bearer extraction, key set
//! retrieval from a local JWKS endpoint, RS256 verification and permission
//! checks, plus the wire mapping through the middleware.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::get,
};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use coffeeshop_api::api::v1::extractors::AuthCtxExtractor;
use coffeeshop_api::middleware::auth::access;
use coffeeshop_api::services::auth::{
    Authenticator, AuthError, jwks::JwksClient, verify::VerifierConfig,
};
use coffeeshop_api::state::AppState;

const KEY_1_PEM: &str = include_str!("fixtures/rsa_key_1.pem");
const KEY_2_PEM: &str = include_str!("fixtures/rsa_key_2.pem");
const KEY_1_JWK: &str = include_str!("fixtures/jwk_key_1.json");
const KEY_2_JWK: &str = include_str!("fixtures/jwk_key_2.json");

const ISSUER: &str = "https://coffeeshop.example.test/";
const AUDIENCE: &str = "coffeeshop";

/// Local stand-in for the identity provider's JWKS endpoint. The served key
/// set can be swapped at runtime and every fetch is counted.
struct JwksServer {
    hits: AtomicUsize,
    body: Mutex<Value>,
}

impl JwksServer {
    fn set_keys(&self, keys: Value) {
        *self.body.lock().unwrap() = json!({ "keys": keys });
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_jwks(State(server): State<Arc<JwksServer>>) -> Json<Value> {
    server.hits.fetch_add(1, Ordering::SeqCst);
    Json(server.body.lock().unwrap().clone())
}

async fn spawn_jwks_server(keys: Value) -> (String, Arc<JwksServer>) {
    let server = Arc::new(JwksServer {
        hits: AtomicUsize::new(0),
        body: Mutex::new(json!({ "keys": keys })),
    });

    let app = Router::new()
        .route("/.well-known/jwks.json", get(serve_jwks))
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (
        format!("http://{}/.well-known/jwks.json", addr),
        server,
    )
}

async fn spawn_broken_jwks_server() -> String {
    let app = Router::new().route(
        "/.well-known/jwks.json",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/.well-known/jwks.json", addr)
}

fn authenticator(jwks_url: String, cooldown: Duration) -> Authenticator {
    let jwks = JwksClient::new(jwks_url, Duration::from_secs(5), cooldown).unwrap();
    Authenticator::new(
        jwks,
        VerifierConfig {
            issuer: ISSUER.to_string(),
            audience: AUDIENCE.to_string(),
        },
    )
}

fn key_1() -> Value {
    serde_json::from_str(KEY_1_JWK).unwrap()
}

fn key_2() -> Value {
    serde_json::from_str(KEY_2_JWK).unwrap()
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn sign(pem: &str, kid: &str, payload: Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    jsonwebtoken::encode(&header, &payload, &key).unwrap()
}

fn barista_token(permissions: Option<Vec<&str>>) -> String {
    let mut payload = json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|barista",
        "exp": now() + 600,
    });
    if let Some(permissions) = permissions {
        payload["permissions"] = json!(permissions);
    }
    sign(KEY_1_PEM, "test-key-1", payload)
}

fn bearer(token: &str) -> axum::http::HeaderMap {
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(
        axum::http::header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    headers
}

#[tokio::test]
async fn missing_header_rejects_before_any_fetch() {
    let (url, server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    let headers = axum::http::HeaderMap::new();
    let err = auth.authorize(&headers, "get:drinks-detail").await.unwrap_err();

    assert_eq!(err, AuthError::MissingAuthHeader);
    assert_eq!(server.hits(), 0, "no JWKS fetch may happen without a token");
}

#[tokio::test]
async fn malformed_headers_are_rejected() {
    let (url, server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    for value in ["Bearer", "Bearer a b", "Token abc"] {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, value.parse().unwrap());
        let err = auth.authorize(&headers, "").await.unwrap_err();
        assert_eq!(err, AuthError::MalformedAuthHeader, "header {value:?}");
    }
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn granted_permission_yields_claims() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    let token = barista_token(Some(vec!["get:drinks-detail"]));
    let claims = auth
        .authorize(&bearer(&token), "get:drinks-detail")
        .await
        .unwrap();

    assert_eq!(claims.sub, "auth0|barista");
    assert!(
        claims
            .permissions
            .as_ref()
            .unwrap()
            .contains(&"get:drinks-detail".to_string())
    );
}

#[tokio::test]
async fn absent_permission_is_denied_with_403() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    let token = barista_token(Some(vec!["get:drinks-detail"]));
    let err = auth.authorize(&bearer(&token), "post:drinks").await.unwrap_err();

    assert_eq!(err, AuthError::PermissionDenied);
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn token_without_permissions_claim_is_403_not_401() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    let token = barista_token(None);
    let err = auth
        .authorize(&bearer(&token), "get:drinks-detail")
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::NoPermissionsClaim);
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn empty_requirement_passes_any_verified_token() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    for token in [barista_token(None), barista_token(Some(vec![]))] {
        assert!(auth.authorize(&bearer(&token), "").await.is_ok());
    }
}

#[tokio::test]
async fn expired_token_is_distinguishable() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    let token = sign(
        KEY_1_PEM,
        "test-key-1",
        json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": "auth0|barista",
            "exp": now() - 3600,
            "permissions": ["get:drinks-detail"],
        }),
    );

    let err = auth
        .authorize(&bearer(&token), "get:drinks-detail")
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::TokenExpired);
    assert!(err.description().contains("expired"));
}

#[tokio::test]
async fn verification_is_idempotent() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(30));

    let token = barista_token(Some(vec!["get:drinks-detail"]));
    let first = auth.authorize(&bearer(&token), "get:drinks-detail").await.unwrap();
    let second = auth.authorize(&bearer(&token), "get:drinks-detail").await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_kid_fails_closed_even_if_another_key_would_verify() {
    // Served set only holds key 1; the token is signed by (and names) key 2.
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::ZERO);

    let token = sign(
        KEY_2_PEM,
        "test-key-2",
        json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": "auth0|barista",
            "exp": now() + 600,
            "permissions": ["get:drinks-detail"],
        }),
    );

    let err = auth
        .authorize(&bearer(&token), "get:drinks-detail")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::UnknownSigningKey);
}

#[tokio::test]
async fn rotated_key_is_picked_up_on_refresh() {
    let (url, server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::ZERO);

    let token = sign(
        KEY_2_PEM,
        "test-key-2",
        json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": "auth0|barista",
            "exp": now() + 600,
            "permissions": ["get:drinks-detail"],
        }),
    );

    let err = auth
        .authorize(&bearer(&token), "get:drinks-detail")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::UnknownSigningKey);

    // Provider rotates: key 2 is published. The next check refreshes and
    // succeeds without restarting the process.
    server.set_keys(json!([key_1(), key_2()]));
    let claims = auth
        .authorize(&bearer(&token), "get:drinks-detail")
        .await
        .unwrap();
    assert_eq!(claims.sub, "auth0|barista");
}

#[tokio::test]
async fn refresh_cooldown_suppresses_repeated_fetches() {
    let (url, server) = spawn_jwks_server(json!([key_1()])).await;
    let auth = authenticator(url, Duration::from_secs(3600));

    let token = sign(
        KEY_2_PEM,
        "test-key-2",
        json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "sub": "auth0|barista",
            "exp": now() + 600,
        }),
    );

    for _ in 0..3 {
        let err = auth.authorize(&bearer(&token), "").await.unwrap_err();
        assert_eq!(err, AuthError::UnknownSigningKey);
    }
    assert_eq!(server.hits(), 1, "unknown kid must not refetch inside the cooldown");
}

#[tokio::test]
async fn unreachable_key_set_is_its_own_failure() {
    let url = spawn_broken_jwks_server().await;
    let auth = authenticator(url, Duration::ZERO);

    let token = barista_token(Some(vec!["get:drinks-detail"]));
    let err = auth
        .authorize(&bearer(&token), "get:drinks-detail")
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::KeySetUnavailable);
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

// ---- middleware-level wire mapping ----------------------------------------

async fn protected(AuthCtxExtractor(ctx): AuthCtxExtractor) -> String {
    ctx.sub
}

fn protected_app(auth: Authenticator, permission: &'static str) -> Router {
    // connect_lazy: no live database is needed, the stub handler never
    // touches the pool.
    let db = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/coffeeshop_test")
        .unwrap();
    let state = AppState::new(db, Arc::new(auth));

    access::require(
        Router::new().route("/protected", get(protected)),
        state.clone(),
        permission,
    )
    .with_state(state)
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn guard_maps_missing_header_to_401_envelope() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let app = protected_app(
        authenticator(url, Duration::from_secs(30)),
        "get:drinks-detail",
    );

    let res = app
        .oneshot(Request::builder().uri("/protected").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body, json!({ "success": false, "error": 401, "message": "Unauthorised." }));
}

#[tokio::test]
async fn guard_maps_permission_denial_to_403_envelope() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let app = protected_app(authenticator(url, Duration::from_secs(30)), "post:drinks");

    let token = barista_token(Some(vec!["get:drinks-detail"]));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = body_json(res).await;
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": 403,
            "message": "You do not have permission to perform that action.",
        })
    );
}

#[tokio::test]
async fn guard_hands_verified_claims_to_the_handler() {
    let (url, _server) = spawn_jwks_server(json!([key_1()])).await;
    let app = protected_app(
        authenticator(url, Duration::from_secs(30)),
        "get:drinks-detail",
    );

    let token = barista_token(Some(vec!["get:drinks-detail"]));
    let res = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"auth0|barista");
}
