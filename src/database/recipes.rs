// ABOUTME: Recipe persistence: create/update/delete, filtered listing, summaries and details
// ABOUTME: Also ingredient-based and similarity lookups used by the recipe endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{bind_all, placeholders, BindValue, Database};
use crate::constants::recipes::SIMILAR_LIMIT;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Difficulty, NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeFilter, RecipeIngredient,
    RecipeIngredientInput, RecipeSummary,
};
use ashpazyar_core::pagination::PageParams;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, Sqlite, Transaction};
use std::collections::HashMap;

/// Recipe columns plus author username and aliased category columns
const SUMMARY_SELECT: &str = r"
    SELECT r.*, u.username AS author_username,
           c.id AS c_id, c.name AS c_name, c.description AS c_description, c.image AS c_image,
           c.created_at AS c_created_at, c.updated_at AS c_updated_at
    FROM recipes r
    JOIN users u ON u.id = r.author_id
    LEFT JOIN categories c ON c.id = r.category_id
";

impl Database {
    pub(super) async fn migrate_recipes(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL CHECK (length(title) <= 200),
                description TEXT NOT NULL DEFAULT '',
                instructions TEXT NOT NULL,
                prep_time INTEGER NOT NULL DEFAULT 0 CHECK (prep_time >= 0),
                cook_time INTEGER NOT NULL DEFAULT 0 CHECK (cook_time >= 0),
                servings INTEGER NOT NULL DEFAULT 4 CHECK (servings >= 1),
                difficulty TEXT NOT NULL DEFAULT 'medium' CHECK (difficulty IN ('easy', 'medium', 'hard')),
                image TEXT,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                views_count INTEGER NOT NULL DEFAULT 0,
                average_rating REAL NOT NULL DEFAULT 0,
                ratings_count INTEGER NOT NULL DEFAULT 0,
                is_public INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_tags (
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (recipe_id, tag_id)
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_dietary_types (
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                dietary_type_id INTEGER NOT NULL REFERENCES dietary_types(id) ON DELETE CASCADE,
                PRIMARY KEY (recipe_id, dietary_type_id)
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                quantity TEXT NOT NULL DEFAULT '' CHECK (length(quantity) <= 100),
                notes TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                UNIQUE (recipe_id, ingredient_id)
            )
            ",
        )
        .await?;

        self.execute_ddl("CREATE INDEX IF NOT EXISTS idx_recipes_created ON recipes(created_at)")
            .await?;
        self.execute_ddl(
            "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id)",
        )
        .await
    }

    /// Insert a recipe with its tags, dietary types, and ingredient lines
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` when a referenced category, tag, dietary type,
    /// or ingredient does not exist
    pub async fn create_recipe(&self, recipe: &NewRecipe) -> AppResult<Recipe> {
        self.validate_references(
            recipe.category_id,
            Some(&recipe.tag_ids),
            Some(&recipe.dietary_type_ids),
            Some(&recipe.ingredients),
        )
        .await?;

        let mut tx = self.pool.begin().await?;
        let recipe_id = insert_recipe(&mut tx, recipe).await?;
        tx.commit().await?;

        self.get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::internal("Recipe vanished after insert"))
    }

    /// Apply a partial update; present set-valued fields replace the whole set
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` for an unknown recipe and `INVALID_INPUT`
    /// for unknown referenced ids
    pub async fn update_recipe(&self, recipe_id: i64, changes: &RecipeChanges) -> AppResult<Recipe> {
        let current = self
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id}")))?;

        self.validate_references(
            changes.category_id.flatten(),
            changes.tag_ids.as_ref(),
            changes.dietary_type_ids.as_ref(),
            changes.ingredients.as_ref(),
        )
        .await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"
            UPDATE recipes
            SET title = ?, description = ?, instructions = ?, prep_time = ?, cook_time = ?,
                servings = ?, difficulty = ?, image = ?, category_id = ?, is_public = ?,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(changes.title.as_ref().unwrap_or(&current.title))
        .bind(changes.description.as_ref().unwrap_or(&current.description))
        .bind(changes.instructions.as_ref().unwrap_or(&current.instructions))
        .bind(changes.prep_time.unwrap_or(current.prep_time))
        .bind(changes.cook_time.unwrap_or(current.cook_time))
        .bind(changes.servings.unwrap_or(current.servings))
        .bind(changes.difficulty.unwrap_or(current.difficulty).as_str())
        .bind(changes.image.clone().unwrap_or(current.image))
        .bind(changes.category_id.unwrap_or(current.category_id))
        .bind(changes.is_public.unwrap_or(current.is_public))
        .bind(Utc::now())
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

        if let Some(tag_ids) = &changes.tag_ids {
            replace_links(&mut tx, "recipe_tags", "tag_id", recipe_id, tag_ids).await?;
        }
        if let Some(dietary_type_ids) = &changes.dietary_type_ids {
            replace_links(
                &mut tx,
                "recipe_dietary_types",
                "dietary_type_id",
                recipe_id,
                dietary_type_ids,
            )
            .await?;
        }
        if let Some(ingredients) = &changes.ingredients {
            replace_ingredients(&mut tx, recipe_id, ingredients).await?;
        }
        tx.commit().await?;

        self.get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id}")))
    }

    /// Delete a recipe; dependent rows cascade
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_recipe(&self, recipe_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete recipe: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Recipe row by id, regardless of visibility
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_recipe(&self, recipe_id: i64) -> AppResult<Option<Recipe>> {
        let row = sqlx::query("SELECT * FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;
        row.as_ref().map(Self::row_to_recipe).transpose()
    }

    /// Recipe by id if `viewer_id` may see it: public, or authored by the viewer
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_visible_recipe(
        &self,
        recipe_id: i64,
        viewer_id: Option<i64>,
    ) -> AppResult<Option<Recipe>> {
        Ok(self
            .get_recipe(recipe_id)
            .await?
            .filter(|recipe| recipe.is_public || Some(recipe.author_id) == viewer_id))
    }

    /// Recipe authored by `author_id` with exactly `title`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn find_recipe_by_title(&self, author_id: i64, title: &str) -> AppResult<Option<Recipe>> {
        let row = sqlx::query("SELECT * FROM recipes WHERE author_id = ? AND title = ? ORDER BY id LIMIT 1")
            .bind(author_id)
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to find recipe: {e}")))?;
        row.as_ref().map(Self::row_to_recipe).transpose()
    }

    /// Filtered, ordered, paginated recipe summaries and the total match count
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        params: PageParams,
    ) -> AppResult<(Vec<RecipeSummary>, i64)> {
        let (where_clause, bind_values) = recipe_where_clause(filter);

        let count_query = format!("SELECT COUNT(*) AS total FROM recipes r{where_clause}");
        let total: i64 = bind_all(sqlx::query(&count_query), &bind_values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count recipes: {e}")))?
            .try_get("total")?;

        let list_query = format!(
            "{SUMMARY_SELECT}{where_clause} ORDER BY {} LIMIT ? OFFSET ?",
            filter.ordering.sql()
        );
        let rows = bind_all(sqlx::query(&list_query), &bind_values)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list recipes: {e}")))?;

        Ok((self.rows_to_summaries(&rows).await?, total))
    }

    /// Summaries of `recipe_ids` in the given order, skipping unknown ids
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipe_summaries(&self, recipe_ids: &[i64]) -> AppResult<Vec<RecipeSummary>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "{SUMMARY_SELECT} WHERE r.id IN ({})",
            placeholders(recipe_ids.len())
        );
        let mut sql_query = sqlx::query(&query);
        for id in recipe_ids {
            sql_query = sql_query.bind(*id);
        }
        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load recipes: {e}")))?;

        let mut by_id: HashMap<i64, RecipeSummary> = self
            .rows_to_summaries(&rows)
            .await?
            .into_iter()
            .map(|summary| (summary.id, summary))
            .collect();
        Ok(recipe_ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Summary of one recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipe_summary(&self, recipe_id: i64) -> AppResult<Option<RecipeSummary>> {
        Ok(self.recipe_summaries(&[recipe_id]).await?.pop())
    }

    /// Full recipe detail with author, ingredient lines, nutrition, and ratings
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipe_detail(&self, recipe_id: i64) -> AppResult<Option<RecipeDetail>> {
        let Some(recipe) = self.get_recipe(recipe_id).await? else {
            return Ok(None);
        };
        let author = self
            .get_user_with_profile(recipe.author_id)
            .await?
            .ok_or_else(|| AppError::internal(format!("Author of recipe {recipe_id} missing")))?;
        let category = match recipe.category_id {
            Some(category_id) => self.get_category(category_id).await?,
            None => None,
        };
        let tags = self
            .tags_for_recipes(&[recipe_id])
            .await?
            .remove(&recipe_id)
            .unwrap_or_default();
        let dietary_types = self
            .dietary_types_for_recipes(&[recipe_id])
            .await?
            .remove(&recipe_id)
            .unwrap_or_default();
        let recipe_ingredients = self.recipe_ingredients(recipe_id).await?;
        let nutrition = self.get_recipe_nutrition(recipe_id).await?;
        let ratings = self.list_ratings(recipe_id).await?;

        Ok(Some(RecipeDetail {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            instructions: recipe.instructions,
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            difficulty: recipe.difficulty,
            image: recipe.image,
            author,
            category,
            tags,
            dietary_types,
            recipe_ingredients,
            nutrition,
            ratings,
            views_count: recipe.views_count,
            average_rating: recipe.average_rating,
            ratings_count: recipe.ratings_count,
            is_public: recipe.is_public,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }))
    }

    /// Ingredient lines of a recipe ordered by `order`, then ingredient name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipe_ingredients(&self, recipe_id: i64) -> AppResult<Vec<RecipeIngredient>> {
        let rows = sqlx::query(
            r"
            SELECT ri.id AS ri_id, ri.quantity, ri.notes AS ri_notes, ri.sort_order,
                   i.id AS i_id, i.name AS i_name, i.description AS i_description, i.image AS i_image,
                   i.unit AS i_unit, i.created_at AS i_created_at, i.updated_at AS i_updated_at
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ?
            ORDER BY ri.sort_order, i.name
            ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load recipe ingredients: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(RecipeIngredient {
                    id: row.try_get("ri_id")?,
                    ingredient: Self::row_to_ingredient(row, "i_")?,
                    quantity: row.try_get("quantity")?,
                    notes: row.try_get("ri_notes")?,
                    order: row.try_get("sort_order")?,
                })
            })
            .collect()
    }

    /// Bump the authenticated view counter
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn increment_recipe_views(&self, recipe_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE recipes SET views_count = views_count + 1 WHERE id = ?")
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count view: {e}")))?;
        Ok(())
    }

    /// Public recipes using any of `ingredient_ids`, most matches first, then by rating
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipes_by_ingredients(&self, ingredient_ids: &[i64]) -> AppResult<Vec<RecipeSummary>> {
        if ingredient_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            r"
            SELECT r.id, COUNT(DISTINCT ri.ingredient_id) AS matching
            FROM recipes r
            JOIN recipe_ingredients ri ON ri.recipe_id = r.id
            WHERE r.is_public = 1 AND ri.ingredient_id IN ({})
            GROUP BY r.id
            ORDER BY matching DESC, r.average_rating DESC, r.id
            ",
            placeholders(ingredient_ids.len())
        );
        let mut sql_query = sqlx::query(&query);
        for id in ingredient_ids {
            sql_query = sql_query.bind(*id);
        }
        let ids = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to match ingredients: {e}")))?
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;

        self.recipe_summaries(&ids).await
    }

    /// Up to ten public recipes sharing the category, an ingredient, or a tag, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn similar_recipes(&self, recipe: &Recipe) -> AppResult<Vec<RecipeSummary>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r"
            SELECT r.id FROM recipes r
            WHERE r.is_public = 1 AND r.id != ?1 AND (
                (r.category_id IS NOT NULL AND r.category_id = ?2)
                OR EXISTS (
                    SELECT 1 FROM recipe_ingredients a
                    JOIN recipe_ingredients b ON b.ingredient_id = a.ingredient_id
                    WHERE a.recipe_id = r.id AND b.recipe_id = ?1
                )
                OR EXISTS (
                    SELECT 1 FROM recipe_tags a
                    JOIN recipe_tags b ON b.tag_id = a.tag_id
                    WHERE a.recipe_id = r.id AND b.recipe_id = ?1
                )
            )
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT ?3
            ",
        )
        .bind(recipe.id)
        .bind(recipe.category_id)
        .bind(SIMILAR_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find similar recipes: {e}")))?;

        self.recipe_summaries(&ids).await
    }

    /// Map exact public recipe titles to ids; first match wins on duplicates
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn public_recipe_ids_by_title(&self, titles: &[String]) -> AppResult<HashMap<String, i64>> {
        if titles.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!(
            "SELECT id, title FROM recipes WHERE is_public = 1 AND title IN ({}) ORDER BY id",
            placeholders(titles.len())
        );
        let mut sql_query = sqlx::query(&query);
        for title in titles {
            sql_query = sql_query.bind(title.as_str());
        }
        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to match titles: {e}")))?;

        let mut by_title = HashMap::new();
        for row in &rows {
            let title: String = row.try_get("title")?;
            let id: i64 = row.try_get("id")?;
            by_title.entry(title).or_insert(id);
        }
        Ok(by_title)
    }

    pub(super) async fn validate_references(
        &self,
        category_id: Option<i64>,
        tag_ids: Option<&Vec<i64>>,
        dietary_type_ids: Option<&Vec<i64>>,
        ingredients: Option<&Vec<RecipeIngredientInput>>,
    ) -> AppResult<()> {
        if let Some(category_id) = category_id {
            self.require_ids("categories", "category", &[category_id]).await?;
        }
        if let Some(tag_ids) = tag_ids {
            self.require_ids("tags", "tag", tag_ids).await?;
        }
        if let Some(dietary_type_ids) = dietary_type_ids {
            self.require_ids("dietary_types", "dietary type", dietary_type_ids)
                .await?;
        }
        if let Some(ingredients) = ingredients {
            let ids: Vec<i64> = ingredients.iter().map(|line| line.ingredient_id).collect();
            self.require_ids("ingredients", "ingredient", &ids).await?;
        }
        Ok(())
    }

    async fn rows_to_summaries(&self, rows: &[SqliteRow]) -> AppResult<Vec<RecipeSummary>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut tags = self.tags_for_recipes(&ids).await?;
        let mut dietary_types = self.dietary_types_for_recipes(&ids).await?;

        rows.iter()
            .map(|row| {
                let recipe = Self::row_to_recipe(row)?;
                let category_id: Option<i64> = row.try_get("c_id")?;
                let category = match category_id {
                    Some(_) => Some(Self::row_to_category(row, "c_")?),
                    None => None,
                };
                Ok(RecipeSummary {
                    id: recipe.id,
                    title: recipe.title,
                    description: recipe.description,
                    prep_time: recipe.prep_time,
                    cook_time: recipe.cook_time,
                    servings: recipe.servings,
                    difficulty: recipe.difficulty,
                    image: recipe.image,
                    author: row.try_get("author_username")?,
                    category,
                    tags: tags.remove(&recipe.id).unwrap_or_default(),
                    dietary_types: dietary_types.remove(&recipe.id).unwrap_or_default(),
                    views_count: recipe.views_count,
                    average_rating: recipe.average_rating,
                    ratings_count: recipe.ratings_count,
                    created_at: recipe.created_at,
                    updated_at: recipe.updated_at,
                })
            })
            .collect()
    }

    pub(super) fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
        let difficulty: String = row.try_get("difficulty")?;
        Ok(Recipe {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            instructions: row.try_get("instructions")?,
            prep_time: row.try_get("prep_time")?,
            cook_time: row.try_get("cook_time")?,
            servings: row.try_get("servings")?,
            difficulty: Difficulty::parse(&difficulty).unwrap_or_default(),
            image: row.try_get("image")?,
            author_id: row.try_get("author_id")?,
            category_id: row.try_get("category_id")?,
            views_count: row.try_get("views_count")?,
            average_rating: row.try_get("average_rating")?,
            ratings_count: row.try_get("ratings_count")?,
            is_public: row.try_get("is_public")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// `WHERE` clause over the `r` alias with its bind values, in order
fn recipe_where_clause(filter: &RecipeFilter) -> (String, Vec<BindValue>) {
    let mut clause = String::from(" WHERE 1=1");
    let mut bind_values = Vec::new();

    match filter.viewer_id {
        Some(viewer_id) => {
            clause.push_str(" AND (r.is_public = 1 OR r.author_id = ?)");
            bind_values.push(BindValue::Int(viewer_id));
        }
        None => clause.push_str(" AND r.is_public = 1"),
    }

    if let Some(category) = filter.category {
        clause.push_str(" AND r.category_id = ?");
        bind_values.push(BindValue::Int(category));
    }

    if let Some(difficulty) = filter.difficulty {
        clause.push_str(" AND r.difficulty = ?");
        bind_values.push(BindValue::Text(difficulty.as_str().to_owned()));
    }

    if let Some(author) = filter.author {
        clause.push_str(" AND r.author_id = ?");
        bind_values.push(BindValue::Int(author));
    }

    if !filter.tags.is_empty() {
        clause.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id IN ({}))",
            placeholders(filter.tags.len())
        ));
        bind_values.extend(filter.tags.iter().copied().map(BindValue::Int));
    }

    if !filter.dietary_types.is_empty() {
        clause.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM recipe_dietary_types rd WHERE rd.recipe_id = r.id AND rd.dietary_type_id IN ({}))",
            placeholders(filter.dietary_types.len())
        ));
        bind_values.extend(filter.dietary_types.iter().copied().map(BindValue::Int));
    }

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        clause.push_str(
            " AND (instr(LOWER(r.title), ?) > 0 OR instr(LOWER(r.description), ?) > 0 \
             OR EXISTS (SELECT 1 FROM recipe_tags st JOIN tags t ON t.id = st.tag_id \
                        WHERE st.recipe_id = r.id AND instr(LOWER(t.name), ?) > 0))",
        );
        // SQLite LOWER() folds ASCII only; fold the term the same way
        let term = term.to_ascii_lowercase();
        bind_values.push(BindValue::Text(term.clone()));
        bind_values.push(BindValue::Text(term.clone()));
        bind_values.push(BindValue::Text(term));
    }

    (clause, bind_values)
}

/// Insert a recipe row with its link rows inside `tx`; references must already be validated
pub(super) async fn insert_recipe(tx: &mut Transaction<'_, Sqlite>, recipe: &NewRecipe) -> AppResult<i64> {
    let now = Utc::now();
    let recipe_id = sqlx::query(
        r"
        INSERT INTO recipes (title, description, instructions, prep_time, cook_time, servings,
                             difficulty, image, author_id, category_id, is_public,
                             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.instructions)
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .bind(recipe.servings)
    .bind(recipe.difficulty.as_str())
    .bind(recipe.image.as_deref())
    .bind(recipe.author_id)
    .bind(recipe.category_id)
    .bind(recipe.is_public)
    .bind(now)
    .bind(now)
    .execute(&mut **tx)
    .await?
    .last_insert_rowid();

    replace_links(tx, "recipe_tags", "tag_id", recipe_id, &recipe.tag_ids).await?;
    replace_links(
        tx,
        "recipe_dietary_types",
        "dietary_type_id",
        recipe_id,
        &recipe.dietary_type_ids,
    )
    .await?;
    replace_ingredients(tx, recipe_id, &recipe.ingredients).await?;
    Ok(recipe_id)
}

/// Replace the rows of a recipe's many-to-many link table
async fn replace_links(
    tx: &mut Transaction<'_, Sqlite>,
    table: &'static str,
    column: &'static str,
    recipe_id: i64,
    ids: &[i64],
) -> AppResult<()> {
    sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = ?"))
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    let insert = format!("INSERT OR IGNORE INTO {table} (recipe_id, {column}) VALUES (?, ?)");
    for id in ids {
        sqlx::query(&insert)
            .bind(recipe_id)
            .bind(*id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Replace a recipe's ingredient lines; later duplicates of an ingredient win
pub(super) async fn replace_ingredients(
    tx: &mut Transaction<'_, Sqlite>,
    recipe_id: i64,
    lines: &[RecipeIngredientInput],
) -> AppResult<()> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    for line in lines {
        if line.quantity.chars().count() > crate::constants::recipes::MAX_QUANTITY_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Quantity for ingredient {} exceeds {} characters",
                line.ingredient_id,
                crate::constants::recipes::MAX_QUANTITY_LENGTH
            )));
        }
        sqlx::query(
            r"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, notes, sort_order)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(recipe_id, ingredient_id)
            DO UPDATE SET quantity = excluded.quantity, notes = excluded.notes, sort_order = excluded.sort_order
            ",
        )
        .bind(recipe_id)
        .bind(line.ingredient_id)
        .bind(&line.quantity)
        .bind(&line.notes)
        .bind(line.order)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
