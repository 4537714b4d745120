//! Recipe catalog for planning cheat meals.
//!
//! Recipes are global, not tied to a journey, and never feed into checkpoint
//! or reward arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Calories and macronutrients per serving. Macros are in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(flatten)]
    pub nutrition: Nutrition,
    pub ingredients: String,
    pub instructions: String,
    pub image_url: Option<String>,
    pub is_favorite: bool,
    pub is_user_created: bool,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// A user-created, non-favorite recipe.
    ///
    /// # Errors
    /// `InvalidValue` when the name is blank.
    pub fn new(
        name: &str,
        category: &str,
        nutrition: Nutrition,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "recipe name must not be empty".into(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: String::new(),
            category: category.trim().to_string(),
            nutrition,
            ingredients: String::new(),
            instructions: String::new(),
            image_url: None,
            is_favorite: false,
            is_user_created: true,
            created_at,
        })
    }

    /// Case-insensitive match on name or category.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
    }
}

/// Recipes matching `search` (blank matches all), optionally favorites only,
/// sorted by name.
pub fn filter_recipes<'a>(
    recipes: &'a [Recipe],
    search: Option<&str>,
    favorites_only: bool,
) -> Vec<&'a Recipe> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let mut matched: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| !favorites_only || r.is_favorite)
        .filter(|r| search.map_or(true, |s| r.matches(s)))
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name));
    matched
}
