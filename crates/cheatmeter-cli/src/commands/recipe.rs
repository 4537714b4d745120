use chrono::Utc;
use clap::Subcommand;
use cheatmeter_core::storage::Database;
use cheatmeter_core::{filter_recipes, CoreError, Nutrition, Recipe};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum RecipeAction {
    /// Add a recipe to the catalog
    Add {
        /// Recipe name
        name: String,
        /// Category (e.g. "Dinner", "Dessert")
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Calories per serving
        #[arg(long, default_value_t = 0)]
        calories: u32,
        /// Protein in grams
        #[arg(long, default_value_t = 0)]
        protein: u32,
        /// Carbohydrates in grams
        #[arg(long, default_value_t = 0)]
        carbs: u32,
        /// Fat in grams
        #[arg(long, default_value_t = 0)]
        fat: u32,
        #[arg(long, default_value = "")]
        ingredients: String,
        #[arg(long, default_value = "")]
        instructions: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// List recipes sorted by name
    List {
        /// Match name or category, ignoring case
        #[arg(long)]
        search: Option<String>,
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe in full
    Show {
        /// Recipe ID
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Toggle a recipe's favorite flag
    Favorite {
        /// Recipe ID
        id: String,
    },
    /// Delete a recipe
    Delete {
        /// Recipe ID
        id: String,
    },
}

fn describe(recipe: &Recipe) -> String {
    format!(
        "{}  {}{}  {} kcal{}",
        recipe.id,
        recipe.name,
        if recipe.category.is_empty() {
            String::new()
        } else {
            format!(" [{}]", recipe.category)
        },
        recipe.nutrition.calories,
        if recipe.is_favorite { "  *" } else { "" }
    )
}

pub fn run(action: RecipeAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        RecipeAction::Add {
            name,
            category,
            description,
            calories,
            protein,
            carbs,
            fat,
            ingredients,
            instructions,
            image_url,
        } => {
            let nutrition = Nutrition {
                calories,
                protein,
                carbs,
                fat,
            };
            let mut recipe = Recipe::new(&name, &category, nutrition, Utc::now())?;
            recipe.description = description;
            recipe.ingredients = ingredients;
            recipe.instructions = instructions;
            recipe.image_url = image_url;
            db.insert_recipe(&recipe)?;
            println!("Recipe added: {}", recipe.id);
        }
        RecipeAction::List {
            search,
            favorites,
            json,
        } => {
            let recipes = db.list_recipes()?;
            let matched = filter_recipes(&recipes, search.as_deref(), favorites);
            if json {
                return print_json(&matched);
            }
            for recipe in matched {
                println!("{}", describe(recipe));
            }
        }
        RecipeAction::Show { id, json } => {
            let recipe = db.get_recipe(&id)?;
            if json {
                return print_json(&recipe);
            }
            println!("{}", describe(&recipe));
            let n = recipe.nutrition;
            println!("  Protein {}g  Carbs {}g  Fat {}g", n.protein, n.carbs, n.fat);
            if !recipe.description.is_empty() {
                println!("  {}", recipe.description);
            }
            if !recipe.ingredients.is_empty() {
                println!("  Ingredients: {}", recipe.ingredients);
            }
            if !recipe.instructions.is_empty() {
                println!("  Instructions: {}", recipe.instructions);
            }
        }
        RecipeAction::Favorite { id } => {
            let recipe = db.toggle_recipe_favorite(&id)?;
            let state = if recipe.is_favorite { "added to" } else { "removed from" };
            println!("{} {state} favorites", recipe.name);
        }
        RecipeAction::Delete { id } => {
            if !db.delete_recipe(&id)? {
                return Err(CoreError::NotFound { kind: "recipe", id }.into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
