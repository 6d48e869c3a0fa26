/*
 * Responsibility
 * - Drinks の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 * - short/long の 2 段階の recipe 表現 (short は name を伏せる)
 */
use serde::{Deserialize, Serialize};

use crate::repos::drink_repo::DrinkRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: i64,
}

/// Request bodies arrive wrapped: `{"drink": {"title": ..., "recipe": [...]}}`.
#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub drink: DrinkSpec,
}

#[derive(Debug, Deserialize)]
pub struct DrinkSpec {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl CreateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_title(&self.drink.title)?;
        validate_recipe(&self.drink.recipe)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub drink: DrinkPatch,
}

#[derive(Debug, Deserialize)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

impl UpdateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.drink.title.is_none() && self.drink.recipe.is_none() {
            return Err("nothing to update");
        }
        if let Some(title) = &self.drink.title {
            validate_title(title)?;
        }
        if let Some(recipe) = &self.drink.recipe {
            validate_recipe(recipe)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err("title is required");
    }
    Ok(())
}

fn validate_recipe(recipe: &[Ingredient]) -> Result<(), &'static str> {
    if recipe.is_empty() {
        return Err("recipe must have at least one ingredient");
    }
    if recipe.iter().any(|i| i.parts < 1) {
        return Err("ingredient parts must be >= 1");
    }
    Ok(())
}

/// `{"success": true, "drinks": [...]}`
#[derive(Debug, Serialize)]
pub struct DrinksResponse {
    pub success: bool,
    pub drinks: Vec<DrinkResponse>,
}

impl DrinksResponse {
    pub fn new(drinks: Vec<DrinkResponse>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// `{"success": true, "delete": <id>}`
#[derive(Debug, Serialize)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i64,
}

#[derive(Debug, Serialize)]
pub struct DrinkResponse {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<RecipePart>,
}

#[derive(Debug, Serialize)]
pub struct RecipePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub color: String,
    pub parts: i64,
}

fn row_ingredients(row: &DrinkRow) -> Result<Vec<Ingredient>, serde_json::Error> {
    serde_json::from_value(row.recipe.clone())
}

impl DrinkResponse {
    /// Public representation: ingredient names are redacted, the colors and
    /// proportions are enough to render the menu.
    pub fn short(row: &DrinkRow) -> Result<Self, serde_json::Error> {
        let recipe = row_ingredients(row)?
            .into_iter()
            .map(|i| RecipePart {
                name: None,
                color: i.color,
                parts: i.parts,
            })
            .collect();

        Ok(Self {
            id: row.drink_id,
            title: row.title.clone(),
            recipe,
        })
    }

    /// Full representation including ingredient names (baristas only).
    pub fn long(row: &DrinkRow) -> Result<Self, serde_json::Error> {
        let recipe = row_ingredients(row)?
            .into_iter()
            .map(|i| RecipePart {
                name: Some(i.name),
                color: i.color,
                parts: i.parts,
            })
            .collect();

        Ok(Self {
            id: row.drink_id,
            title: row.title.clone(),
            recipe,
        })
    }
}
