//! Per-route authorization guard: bearer token → verified claims → AuthCtx.
//!
//! Responsibility:
//! - Run `Authenticator::authorize` for every request on a protected route,
//!   parameterized by the permission that route requires.
//! - On success, put the resulting `AuthCtx` into request extensions so
//!   handlers can read the verified identity without re-verifying.
//!
//! Wiring:
//! ```ignore
//! let protected = access::require(
//!     Router::new().route("/drinks-detail", get(get_drinks_detail)),
//!     state.clone(),
//!     "get:drinks-detail",
//! );
//! ```

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Guard every route in `router` behind `permission`.
///
/// An empty permission string still runs token extraction and verification
/// but skips the RBAC check (that is what makes a route token-gated without
/// being permission-gated).
pub fn require(
    router: Router<AppState>,
    state: AppState,
    permission: &'static str,
) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、
    // `from_fn_with_state` で state と permission をまとめて渡す
    router.route_layer(middleware::from_fn_with_state((state, permission), guard))
}

async fn guard(
    State((state, permission)): State<(AppState, &'static str)>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = state
        .auth
        .authorize(req.headers(), permission)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, permission, "request rejected by auth guard");
            AppError::Auth(err)
        })?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(&claims));

    Ok(next.run(req).await)
}
