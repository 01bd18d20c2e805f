// ABOUTME: Demo data generator filling an empty database with users, catalog, and recipes
// ABOUTME: Backs `ashpazyar-cli seed`; reruns reuse existing demo users and catalog rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Demo Data
//!
//! [`Seeder::run`] creates catalog entries (categories, tags, dietary types,
//! ingredients with nutrition and substitutes), demo accounts sharing
//! [`DEMO_PASSWORD`], and randomised recipes with ratings, bookmarks and
//! history. Randomness comes from the caller's [`Rng`] so a seeded generator
//! reproduces the same data.

use crate::auth::hash_password;
use crate::constants::seed::{
    DEMO_PASSWORD, MAX_BOOKMARKS, MAX_HISTORY, MAX_RATINGS_PER_RECIPE, MAX_SUBSTITUTE_PAIRS,
    NUTRITION_INGREDIENTS, USERNAME_PREFIX,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Difficulty, Ingredient, NewCatalogEntry, NewIngredient, NewRecipe, NewSubstitute, NewUser,
    NutritionFacts, ProfileChanges, RecipeIngredientInput, SkillLevel, User, UserRole,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

const CATEGORIES: &[&str] = &[
    "Main Course", "Appetizer", "Dessert", "Salad", "Soup", "Breakfast", "Lunch", "Dinner",
    "Snack", "Beverage",
];

const TAGS: &[&str] = &[
    "quick", "easy", "healthy", "vegetarian", "vegan", "gluten-free", "dairy-free", "spicy",
    "sweet", "savory", "comfort-food", "low-carb",
];

const DIETARY_TYPES: &[&str] = &["Vegan", "Vegetarian", "Gluten-Free", "Dairy-Free", "Keto", "Paleo"];

const INGREDIENTS: &[&str] = &[
    "Flour", "Sugar", "Salt", "Pepper", "Olive Oil", "Butter", "Eggs", "Milk", "Chicken", "Beef",
    "Fish", "Rice", "Pasta", "Tomatoes", "Onions", "Garlic", "Carrots", "Potatoes", "Bell Peppers",
    "Mushrooms", "Spinach", "Lettuce", "Cheese", "Yogurt", "Bread", "Lemon", "Lime", "Basil",
    "Oregano", "Thyme", "Rosemary", "Cumin", "Paprika", "Cinnamon", "Vanilla", "Chocolate",
    "Strawberries", "Bananas", "Apples", "Oranges",
];

const UNITS: &[&str] = &["g", "ml", "cup", "tsp", "tbsp", "piece"];

const CUISINES: &[&str] = &["Italian", "Mexican", "Asian", "American"];

const FIRST_NAMES: &[&str] = &["Sara", "Reza", "Maryam", "Ali", "Neda", "Kian", "Leila", "Omid"];

const LAST_NAMES: &[&str] = &["Ahmadi", "Karimi", "Hosseini", "Rahimi", "Moradi", "Jafari"];

const TITLE_STYLES: &[&str] = &["Rustic", "Herby", "Smoky", "Golden", "Spiced", "Creamy", "Crispy"];

const TITLE_DISHES: &[&str] = &["Stew", "Pilaf", "Kebab", "Frittata", "Soup", "Salad", "Cake", "Wrap"];

const STEPS: &[&str] = &[
    "Prepare and measure the ingredients.",
    "Heat the pan over medium heat.",
    "Cook the aromatics until soft.",
    "Add the main ingredients and stir well.",
    "Simmer until everything is tender.",
    "Season to taste and rest before serving.",
];

/// How much demo data to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    /// Demo accounts
    pub users: usize,
    /// Recipes, spread across the demo accounts
    pub recipes: usize,
    /// Ingredients, capped by the built-in ingredient list
    pub ingredients: usize,
}

/// Rows created by a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// New accounts
    pub users: usize,
    /// New categories
    pub categories: usize,
    /// New tags
    pub tags: usize,
    /// New dietary types
    pub dietary_types: usize,
    /// New ingredients
    pub ingredients: usize,
    /// New recipes
    pub recipes: usize,
    /// New ratings
    pub ratings: usize,
    /// New bookmarks
    pub bookmarks: usize,
    /// History entries recorded
    pub history: usize,
}

/// Catalog ids the recipe generator draws from
struct Catalog {
    categories: Vec<i64>,
    tags: Vec<i64>,
    dietary_types: Vec<i64>,
    ingredients: Vec<Ingredient>,
}

/// Fills a database with demo data
pub struct Seeder<'a> {
    database: &'a Database,
    options: SeedOptions,
}

impl<'a> Seeder<'a> {
    /// Create a seeder over `database`
    #[must_use]
    pub const fn new(database: &'a Database, options: SeedOptions) -> Self {
        Self { database, options }
    }

    /// Create the catalog, the demo users, and their recipes
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` when recipes are requested without users, or
    /// any database error
    pub async fn run<R: Rng>(&self, rng: &mut R) -> AppResult<SeedSummary> {
        if self.options.recipes > 0 && self.options.users == 0 {
            return Err(AppError::invalid_input("Recipes need at least one demo user"));
        }

        let mut summary = SeedSummary::default();
        let catalog = self.seed_catalog(rng, &mut summary).await?;
        let users = self.seed_users(rng, &mut summary).await?;
        let public_recipes = self.seed_recipes(rng, &catalog, &users, &mut summary).await?;
        self.seed_activity(rng, &users, &public_recipes, &mut summary)
            .await?;

        info!(
            users = summary.users,
            ingredients = summary.ingredients,
            recipes = summary.recipes,
            "Demo data seeded"
        );
        Ok(summary)
    }

    async fn seed_catalog<R: Rng>(&self, rng: &mut R, summary: &mut SeedSummary) -> AppResult<Catalog> {
        let database = self.database;

        let mut existing: HashMap<String, i64> = database
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();
        let mut categories = Vec::with_capacity(CATEGORIES.len());
        for name in CATEGORIES {
            let id = match existing.remove(*name) {
                Some(id) => id,
                None => {
                    summary.categories += 1;
                    database.create_category(&catalog_entry(name)).await?.id
                }
            };
            categories.push(id);
        }

        let mut existing: HashMap<String, i64> =
            database.list_tags().await?.into_iter().map(|t| (t.name, t.id)).collect();
        let mut tags = Vec::with_capacity(TAGS.len());
        for name in TAGS {
            let id = match existing.remove(*name) {
                Some(id) => id,
                None => {
                    summary.tags += 1;
                    database.create_tag(name).await?.id
                }
            };
            tags.push(id);
        }

        let mut existing: HashMap<String, i64> = database
            .list_dietary_types()
            .await?
            .into_iter()
            .map(|d| (d.name, d.id))
            .collect();
        let mut dietary_types = Vec::with_capacity(DIETARY_TYPES.len());
        for name in DIETARY_TYPES {
            let id = match existing.remove(*name) {
                Some(id) => id,
                None => {
                    summary.dietary_types += 1;
                    database.create_dietary_type(&catalog_entry(name)).await?.id
                }
            };
            dietary_types.push(id);
        }

        let mut ingredients = Vec::new();
        for name in INGREDIENTS.iter().take(self.options.ingredients) {
            let ingredient = match database.get_ingredient_by_name(name).await? {
                Some(ingredient) => ingredient,
                None => {
                    summary.ingredients += 1;
                    let unit = UNITS.choose(rng).copied().unwrap_or("g");
                    database
                        .create_ingredient(&NewIngredient {
                            name: (*name).to_owned(),
                            description: format!("{name} for everyday cooking"),
                            image: None,
                            unit: unit.to_owned(),
                        })
                        .await?
                }
            };
            ingredients.push(ingredient);
        }

        for ingredient in ingredients.iter().take(NUTRITION_INGREDIENTS) {
            if database.get_ingredient_nutrition(ingredient.id).await?.is_none() {
                let per_100g = NutritionFacts {
                    calories: rng.gen_range(50.0..500.0),
                    protein: rng.gen_range(0.0..30.0),
                    carbohydrates: rng.gen_range(0.0..80.0),
                    fat: rng.gen_range(0.0..40.0),
                    fiber: rng.gen_range(0.0..10.0),
                    sugar: rng.gen_range(0.0..50.0),
                    sodium: rng.gen_range(0.0..2000.0),
                };
                database.upsert_ingredient_nutrition(ingredient.id, &per_100g).await?;
            }
        }

        for pair in ingredients.chunks_exact(2).take(MAX_SUBSTITUTE_PAIRS) {
            let (original, substitute) = (&pair[0], &pair[1]);
            let known = database
                .get_substitutes(original.id)
                .await?
                .iter()
                .any(|s| s.substitute_ingredient.id == substitute.id);
            if !known {
                database
                    .add_substitute(
                        original.id,
                        &NewSubstitute {
                            substitute_ingredient_id: substitute.id,
                            substitution_ratio: 1.0,
                            notes: format!("Swap {} for {}", original.name, substitute.name),
                        },
                    )
                    .await?;
            }
        }

        Ok(Catalog {
            categories,
            tags,
            dietary_types,
            ingredients,
        })
    }

    async fn seed_users<R: Rng>(&self, rng: &mut R, summary: &mut SeedSummary) -> AppResult<Vec<User>> {
        let database = self.database;
        let password_hash = hash_password(DEMO_PASSWORD).await?;
        let mut users = Vec::with_capacity(self.options.users);

        for index in 1..=self.options.users {
            let username = format!("{USERNAME_PREFIX}{index}");
            if let Some(existing) = database.get_user_by_username(&username).await? {
                users.push(existing);
                continue;
            }

            let student_number = rng
                .gen_bool(0.5)
                .then(|| format!("{:07}", rng.gen_range(0..10_000_000)));
            let user = database
                .create_user(&NewUser {
                    username: username.clone(),
                    email: format!("{username}@example.com"),
                    password_hash: password_hash.clone(),
                    first_name: pick(rng, FIRST_NAMES).to_owned(),
                    last_name: pick(rng, LAST_NAMES).to_owned(),
                    student_number,
                    role: UserRole::User,
                })
                .await?;

            let cuisine_count = rng.gen_range(1..=3);
            let favorite_cuisines = CUISINES
                .choose_multiple(rng, cuisine_count)
                .map(|c| (*c).to_owned())
                .collect();
            let skill = *[SkillLevel::Beginner, SkillLevel::Intermediate, SkillLevel::Advanced]
                .choose(rng)
                .unwrap_or(&SkillLevel::Beginner);
            database
                .update_profile(
                    user.id,
                    &ProfileChanges {
                        dietary_preferences: Some(
                            serde_json::json!({ "allergies": [], "restrictions": [] }),
                        ),
                        favorite_cuisines: Some(favorite_cuisines),
                        cooking_skill_level: Some(skill),
                    },
                )
                .await?;

            summary.users += 1;
            users.push(user);
        }
        Ok(users)
    }

    /// Returns the ids of the public recipes created
    async fn seed_recipes<R: Rng>(
        &self,
        rng: &mut R,
        catalog: &Catalog,
        users: &[User],
        summary: &mut SeedSummary,
    ) -> AppResult<Vec<i64>> {
        let database = self.database;
        let mut public_recipes = Vec::new();

        for _ in 0..self.options.recipes {
            let Some(author) = users.choose(rng) else {
                break;
            };

            let line_count = rng.gen_range(3..=10).min(catalog.ingredients.len());
            let ingredients = catalog
                .ingredients
                .choose_multiple(rng, line_count)
                .enumerate()
                .map(|(order, ingredient)| RecipeIngredientInput {
                    ingredient_id: ingredient.id,
                    quantity: format!("{} {}", rng.gen_range(1..=5), ingredient.unit),
                    notes: String::new(),
                    order: i64::try_from(order).unwrap_or(i64::MAX),
                })
                .collect();
            let tag_count = rng.gen_range(1..=4);
            let dietary_count = rng.gen_range(0..=3);
            let step_count = rng.gen_range(3..=STEPS.len());
            let is_public = rng.gen_bool(0.75);

            let recipe = database
                .create_recipe(&NewRecipe {
                    title: format!("{} {}", pick(rng, TITLE_STYLES), pick(rng, TITLE_DISHES)),
                    description: format!("A {} dish for the family table", pick(rng, CUISINES)),
                    instructions: STEPS[..step_count].join("\n"),
                    prep_time: rng.gen_range(10..=120),
                    cook_time: rng.gen_range(15..=180),
                    servings: rng.gen_range(1..=8),
                    difficulty: *[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
                        .choose(rng)
                        .unwrap_or(&Difficulty::Medium),
                    image: None,
                    author_id: author.id,
                    category_id: catalog.categories.choose(rng).copied(),
                    is_public,
                    tag_ids: catalog.tags.choose_multiple(rng, tag_count).copied().collect(),
                    dietary_type_ids: catalog
                        .dietary_types
                        .choose_multiple(rng, dietary_count)
                        .copied()
                        .collect(),
                    ingredients,
                })
                .await?;
            summary.recipes += 1;

            let facts = NutritionFacts {
                calories: rng.gen_range(100.0..800.0),
                protein: rng.gen_range(5.0..50.0),
                carbohydrates: rng.gen_range(10.0..100.0),
                fat: rng.gen_range(2.0..40.0),
                fiber: rng.gen_range(0.0..15.0),
                sugar: rng.gen_range(0.0..50.0),
                sodium: rng.gen_range(100.0..2000.0),
            };
            database.upsert_recipe_nutrition(recipe.id, &facts).await?;

            let rating_count = rng.gen_range(0..=MAX_RATINGS_PER_RECIPE.min(users.len()));
            for rater in users.choose_multiple(rng, rating_count) {
                let comment = if rng.gen_bool(0.5) { "Would cook again" } else { "" };
                database
                    .upsert_rating(recipe.id, rater.id, rng.gen_range(1..=5), comment)
                    .await?;
                summary.ratings += 1;
            }

            if is_public {
                public_recipes.push(recipe.id);
            }
        }
        Ok(public_recipes)
    }

    async fn seed_activity<R: Rng>(
        &self,
        rng: &mut R,
        users: &[User],
        public_recipes: &[i64],
        summary: &mut SeedSummary,
    ) -> AppResult<()> {
        let database = self.database;
        if users.is_empty() || public_recipes.is_empty() {
            return Ok(());
        }

        for _ in 0..MAX_BOOKMARKS.min(self.options.recipes * 2) {
            let (Some(user), Some(recipe_id)) = (users.choose(rng), public_recipes.choose(rng)) else {
                break;
            };
            if !database.is_bookmarked(user.id, *recipe_id).await? {
                database.create_bookmark(user.id, *recipe_id).await?;
                summary.bookmarks += 1;
            }
        }

        for _ in 0..MAX_HISTORY.min(self.options.recipes * 3) {
            let (Some(user), Some(recipe_id)) = (users.choose(rng), public_recipes.choose(rng)) else {
                break;
            };
            database.touch_history(user.id, *recipe_id).await?;
            summary.history += 1;
        }
        Ok(())
    }
}

fn catalog_entry(name: &str) -> NewCatalogEntry {
    NewCatalogEntry {
        name: name.to_owned(),
        description: String::new(),
        image: None,
    }
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small() -> SeedOptions {
        SeedOptions {
            users: 3,
            recipes: 6,
            ingredients: 12,
        }
    }

    #[tokio::test]
    async fn test_seed_fills_catalog_and_recipes() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let summary = Seeder::new(&db, small()).run(&mut rng).await.unwrap();
        assert_eq!(summary.users, 3);
        assert_eq!(summary.categories, CATEGORIES.len());
        assert_eq!(summary.tags, TAGS.len());
        assert_eq!(summary.dietary_types, DIETARY_TYPES.len());
        assert_eq!(summary.ingredients, 12);
        assert_eq!(summary.recipes, 6);

        let user = db.get_user_by_username("demo_cook1").await.unwrap().unwrap();
        assert!(verify_password(DEMO_PASSWORD, &user.password_hash).await.unwrap());
        let profile = db.get_profile(user.id).await.unwrap().unwrap();
        assert!(!profile.favorite_cuisines.is_empty());

        let flour = db.get_ingredient_by_name("Flour").await.unwrap().unwrap();
        assert!(db.get_ingredient_nutrition(flour.id).await.unwrap().is_some());
        assert_eq!(db.get_substitutes(flour.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_rerun_reuses_users_and_catalog() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        Seeder::new(&db, small()).run(&mut rng).await.unwrap();

        let again = Seeder::new(&db, small()).run(&mut rng).await.unwrap();
        assert_eq!(again.users, 0);
        assert_eq!(again.categories, 0);
        assert_eq!(again.ingredients, 0);
        assert_eq!(again.recipes, 6);
        assert_eq!(db.list_tags().await.unwrap().len(), TAGS.len());
    }

    #[tokio::test]
    async fn test_recipes_require_users() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let options = SeedOptions {
            users: 0,
            ..small()
        };
        let result = Seeder::new(&db, options).run(&mut StdRng::seed_from_u64(1)).await;
        assert!(result.is_err());
    }
}
