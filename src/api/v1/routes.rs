/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - どの route にどの permission guard を掛けるかをここで決める
 *   (public と protected を別 Router に分けて merge する)
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::middleware::auth::access;
use crate::state::AppState;

use crate::api::v1::handlers::{
    drinks::{create_drink, delete_drink, get_drinks_detail, list_drinks, update_drink},
    health::health,
};

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/drinks", get(list_drinks));

    let detail = access::require(
        Router::new().route("/drinks-detail", get(get_drinks_detail)),
        state.clone(),
        "get:drinks-detail",
    );

    let create = access::require(
        Router::new().route("/drinks", post(create_drink)),
        state.clone(),
        "post:drinks",
    );

    let edit = access::require(
        Router::new().route("/drinks/{drink_id}", patch(update_drink)),
        state.clone(),
        "patch:drinks",
    );

    let remove = access::require(
        Router::new().route("/drinks/{drink_id}", delete(delete_drink)),
        state,
        "delete:drinks",
    );

    public
        .merge(detail)
        .merge(create)
        .merge(edit)
        .merge(remove)
}
