//! Recipe catalog persistence.

use rusqlite::{params, OptionalExtension, Row};

use super::database::parse_ts;
use super::Database;
use crate::error::{CoreError, Result};
use crate::recipe::{Nutrition, Recipe};

const RECIPE_COLUMNS: &str = "id, name, description, category, calories, protein, carbs, fat,
     ingredients, instructions, image_url, is_favorite, is_user_created, created_at";

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        nutrition: Nutrition {
            calories: row.get(4)?,
            protein: row.get(5)?,
            carbs: row.get(6)?,
            fat: row.get(7)?,
        },
        ingredients: row.get(8)?,
        instructions: row.get(9)?,
        image_url: row.get(10)?,
        is_favorite: row.get(11)?,
        is_user_created: row.get(12)?,
        created_at: parse_ts(13, row.get(13)?)?,
    })
}

impl Database {
    pub fn insert_recipe(&self, recipe: &Recipe) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO recipes ({RECIPE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                recipe.id,
                recipe.name,
                recipe.description,
                recipe.category,
                recipe.nutrition.calories,
                recipe.nutrition.protein,
                recipe.nutrition.carbs,
                recipe.nutrition.fat,
                recipe.ingredients,
                recipe.instructions,
                recipe.image_url,
                recipe.is_favorite,
                recipe.is_user_created,
                recipe.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_recipe(&self, id: &str) -> Result<Recipe> {
        self.conn()
            .query_row(
                &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1"),
                params![id],
                recipe_from_row,
            )
            .optional()?
            .ok_or_else(|| CoreError::NotFound {
                kind: "recipe",
                id: id.to_string(),
            })
    }

    /// Every stored recipe, sorted by name.
    pub fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY name ASC"))?;
        let rows = stmt.query_map([], recipe_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Flip the favorite flag and return the updated recipe.
    pub fn toggle_recipe_favorite(&self, id: &str) -> Result<Recipe> {
        self.transaction(|db| {
            let mut recipe = db.get_recipe(id)?;
            recipe.is_favorite = !recipe.is_favorite;
            db.conn().execute(
                "UPDATE recipes SET is_favorite = ?2 WHERE id = ?1",
                params![recipe.id, recipe.is_favorite],
            )?;
            tracing::debug!(recipe = %recipe.id, favorite = recipe.is_favorite, "recipe favorite toggled");
            Ok(recipe)
        })
    }

    pub fn delete_recipe(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn()
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
