/*
 * Responsibility
 * - drinks テーブル向け SQLx 操作
 * - PgPool を受け取り CRUD を提供
 * - recipe は JSONB のまま受け渡し (DTO 層で形を付ける)
 */
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DrinkRow {
    #[sqlx(rename = "drinkId")]
    pub drink_id: i64,

    pub title: String,

    /// JSON array of `{name, color, parts}` ingredients.
    pub recipe: serde_json::Value,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

pub async fn list(pool: &PgPool) -> Result<Vec<DrinkRow>, RepoError> {
    let rows = sqlx::query_as::<_, DrinkRow>(
        r#"
        SELECT
            "drinkId", title, recipe, "createdAt", "updatedAt"
        FROM drinks
        ORDER BY "drinkId"
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(rows)
}

pub async fn get(pool: &PgPool, drink_id: i64) -> Result<Option<DrinkRow>, RepoError> {
    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        SELECT
            "drinkId", title, recipe, "createdAt", "updatedAt"
        FROM drinks
        WHERE "drinkId" = $1
        "#,
    )
    .bind(drink_id)
    .fetch_optional(pool)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn create(
    pool: &PgPool,
    title: &str,
    recipe: &serde_json::Value,
) -> Result<DrinkRow, RepoError> {
    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        INSERT INTO drinks (title, recipe)
        VALUES ($1, $2)
        RETURNING
            "drinkId", title, recipe, "createdAt", "updatedAt"
        "#,
    )
    .bind(title)
    .bind(recipe)
    .fetch_one(pool)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn update(
    pool: &PgPool,
    drink_id: i64,
    title: Option<&str>,
    recipe: Option<&serde_json::Value>,
) -> Result<Option<DrinkRow>, RepoError> {
    let row = sqlx::query_as::<_, DrinkRow>(
        r#"
        UPDATE drinks
        SET
            title = COALESCE($2, title),
            recipe = COALESCE($3, recipe),
            "updatedAt" = now()
        WHERE "drinkId" = $1
        RETURNING
            "drinkId", title, recipe, "createdAt", "updatedAt"
        "#,
    )
    .bind(drink_id)
    .bind(title)
    .bind(recipe)
    .fetch_optional(pool)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn delete(pool: &PgPool, drink_id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM drinks
        WHERE "drinkId" = $1
        "#,
    )
    .bind(drink_id)
    .execute(pool)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(result.rows_affected() > 0)
}
