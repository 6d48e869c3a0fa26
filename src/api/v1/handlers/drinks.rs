/*
 * Responsibility
 * - /drinks 系 CRUD handler
 * - 認可は route 側の guard が済ませる。ここは AuthCtx を受け取るだけ
 * - DTO validation → repo 呼び出し → envelope へ変換
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::drinks::{
            CreateDrinkRequest, DeleteDrinkResponse, DrinkResponse, DrinksResponse,
            UpdateDrinkRequest,
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::drink_repo,
    state::AppState,
};

fn short(row: &drink_repo::DrinkRow) -> Result<DrinkResponse, AppError> {
    DrinkResponse::short(row).map_err(|e| {
        tracing::error!(error = %e, drink_id = row.drink_id, "stored recipe is not valid");
        AppError::Internal
    })
}

fn long(row: &drink_repo::DrinkRow) -> Result<DrinkResponse, AppError> {
    DrinkResponse::long(row).map_err(|e| {
        tracing::error!(error = %e, drink_id = row.drink_id, "stored recipe is not valid");
        AppError::Internal
    })
}

/// GET /drinks — public menu, short representation.
pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse>, AppError> {
    let rows = drink_repo::list(&state.db).await?;

    let mut drinks = Vec::with_capacity(rows.len());
    for row in &rows {
        drinks.push(short(row)?);
    }

    Ok(Json(DrinksResponse::new(drinks)))
}

/// GET /drinks-detail — full recipes, requires `get:drinks-detail`.
pub async fn get_drinks_detail(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<DrinksResponse>, AppError> {
    tracing::debug!(subject = %ctx.sub, "drinks detail requested");

    let rows = drink_repo::list(&state.db).await?;

    let mut drinks = Vec::with_capacity(rows.len());
    for row in &rows {
        drinks.push(long(row)?);
    }

    Ok(Json(DrinksResponse::new(drinks)))
}

/// POST /drinks — requires `post:drinks`.
pub async fn create_drink(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<CreateDrinkRequest>,
) -> Result<(StatusCode, Json<DrinksResponse>), AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let recipe = serde_json::to_value(&req.drink.recipe).map_err(|_| AppError::Internal)?;

    let row = drink_repo::create(&state.db, &req.drink.title, &recipe).await?;
    tracing::info!(subject = %ctx.sub, drink_id = row.drink_id, "drink created");

    let res = DrinksResponse::new(vec![long(&row)?]);
    Ok((StatusCode::CREATED, Json(res)))
}

/// PATCH /drinks/{drink_id} — requires `patch:drinks`.
pub async fn update_drink(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(drink_id): Path<i64>,
    Json(req): Json<UpdateDrinkRequest>,
) -> Result<Json<DrinksResponse>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let recipe = match &req.drink.recipe {
        Some(recipe) => Some(serde_json::to_value(recipe).map_err(|_| AppError::Internal)?),
        None => None,
    };

    let row = drink_repo::update(
        &state.db,
        drink_id,
        req.drink.title.as_deref(),
        recipe.as_ref(),
    )
    .await?
    .ok_or(AppError::not_found("drink"))?;

    tracing::info!(subject = %ctx.sub, drink_id, "drink updated");

    Ok(Json(DrinksResponse::new(vec![long(&row)?])))
}

/// DELETE /drinks/{drink_id} — requires `delete:drinks`.
pub async fn delete_drink(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(drink_id): Path<i64>,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    let deleted = drink_repo::delete(&state.db, drink_id).await?;

    if !deleted {
        return Err(AppError::not_found("drink"));
    }

    tracing::info!(subject = %ctx.sub, drink_id, "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: drink_id,
    }))
}
