// ABOUTME: JSONL dataset importer turning scraped recipe records into stored recipes
// ABOUTME: Text cleanup, duration and difficulty heuristics, quantity matching, and the import run
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Dataset Importer
//!
//! Each dataset line is a [`RecipeInput`], the same shape the vector server
//! accepts on `/insert`. Records become public recipes owned by the author
//! named on the command line, or by an auto-created `system` user.
//!
//! Lines that do not parse are skipped with a warning. A record that fails to
//! import is counted in [`ImportSummary::errors`] and the run continues.

use crate::auth::{generate_jwt_secret, hash_password};
use crate::constants::dataset::{
    DEFAULT_QUANTITY, DEFAULT_TIMES, DESCRIPTION_MAX_CHARS, MIN_COOK_MINUTES, MIN_PREP_MINUTES,
    SYSTEM_EMAIL, SYSTEM_USERNAME,
};
use crate::constants::recipes::{DEFAULT_SERVINGS, MAX_QUANTITY_LENGTH, MAX_TITLE_LENGTH};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Difficulty, NewRecipe, NewUser, RecipeChanges, RecipeIngredientInput, User, UserRole,
};
use crate::vector::RecipeInput;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static DURATION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: 45 دقیقه, ۳۰دقیقه
    Regex::new(r"(\d+)\s*دقیقه").ok()
});

/// Trim and collapse every whitespace run to a single space
#[must_use]
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Numeric value of a run of ASCII, Persian or Arabic-Indic digits
fn parse_digits(digits: &str) -> Option<i64> {
    digits.chars().try_fold(0_i64, |total, c| {
        let digit = match c {
            '0'..='9' => c.to_digit(10),
            '۰'..='۹' => Some(u32::from(c) - u32::from('۰')),
            '٠'..='٩' => Some(u32::from(c) - u32::from('٠')),
            _ => None,
        }?;
        total.checked_mul(10)?.checked_add(i64::from(digit))
    })
}

/// Prep and cook minutes derived from free-text durations
///
/// Every `<n> دقیقه` across all entries is summed. Prep takes a third of the
/// total (at least 10), cook the remainder (at least 20). Without any
/// recognisable duration the defaults (15, 30) apply.
#[must_use]
pub fn parse_time(taken_time: Option<&[String]>) -> (i64, i64) {
    let Some(pattern) = DURATION_PATTERN.as_ref() else {
        return DEFAULT_TIMES;
    };

    let total: i64 = taken_time
        .unwrap_or_default()
        .iter()
        .flat_map(|entry| pattern.captures_iter(entry))
        .filter_map(|captures| captures.get(1).and_then(|m| parse_digits(m.as_str())))
        .fold(0_i64, i64::saturating_add);

    if total <= 0 {
        return DEFAULT_TIMES;
    }

    let prep = (total / 3).max(MIN_PREP_MINUTES);
    let cook = (total - prep).max(MIN_COOK_MINUTES);
    (prep, cook)
}

/// Difficulty guessed from the number and length of steps and the ingredient count
#[must_use]
pub fn estimate_difficulty(steps: &[String], ingredient_count: usize) -> Difficulty {
    let step_count = steps.len();
    let total_length: usize = steps.iter().map(|step| step.chars().count()).sum();

    if step_count <= 3 && total_length < 500 && ingredient_count <= 5 {
        Difficulty::Easy
    } else if step_count <= 6 && total_length < 1500 && ingredient_count <= 10 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

/// Amount for `name` looked up in the record's raw ingredient map
///
/// An exact key wins; otherwise the first key that contains or is contained
/// in the name, compared case-insensitively. Falls back to `به میزان لازم`.
#[must_use]
pub fn match_quantity(name: &str, ingredients: &BTreeMap<String, String>) -> String {
    let quantity = ingredients.get(name).or_else(|| {
        let wanted = name.to_lowercase();
        ingredients.iter().find_map(|(key, value)| {
            let key = clean_text(key).to_lowercase();
            let related = !key.is_empty() && (key.contains(&wanted) || wanted.contains(&key));
            related.then_some(value)
        })
    });

    let cleaned = quantity.map(|value| clean_text(value)).unwrap_or_default();
    if cleaned.is_empty() {
        return DEFAULT_QUANTITY.to_owned();
    }
    truncate_chars(&cleaned, MAX_QUANTITY_LENGTH)
}

/// One ingredient line of a [`RecipeDraft`], still referenced by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftIngredient {
    /// Cleaned ingredient name
    pub name: String,
    /// Matched amount
    pub quantity: String,
}

/// Recipe fields derived from a dataset record before anything is stored
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    /// Cleaned dish name
    pub title: String,
    /// Cleaned opening of the first step
    pub description: String,
    /// Steps joined by newlines
    pub instructions: String,
    /// Preparation minutes
    pub prep_time: i64,
    /// Cooking minutes
    pub cook_time: i64,
    /// Estimated difficulty
    pub difficulty: Difficulty,
    /// First image URL
    pub image: Option<String>,
    /// Ingredient lines in dataset order, unique by name
    pub ingredients: Vec<DraftIngredient>,
}

impl RecipeDraft {
    /// Derive a draft from a dataset record
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` if the record has no dish name
    pub fn from_record(record: &RecipeInput) -> AppResult<Self> {
        let title = truncate_chars(&clean_text(&record.foodname), MAX_TITLE_LENGTH);
        if title.is_empty() {
            return Err(AppError::invalid_input("Dataset record has no foodname"));
        }

        let description = record
            .recipe
            .first()
            .map(|step| clean_text(&truncate_chars(step, DESCRIPTION_MAX_CHARS)))
            .unwrap_or_default();
        let (prep_time, cook_time) = parse_time(record.taken_time.as_deref());

        let names: Vec<&String> = if record.canonical.is_empty() {
            record.ingredients.keys().collect()
        } else {
            record.canonical.iter().collect()
        };
        let mut seen = HashSet::new();
        let mut ingredients = Vec::new();
        for raw in names {
            let name = clean_text(raw);
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            let quantity = match_quantity(&name, &record.ingredients);
            ingredients.push(DraftIngredient { name, quantity });
        }

        Ok(Self {
            title,
            description,
            instructions: record.recipe.join("\n"),
            prep_time,
            cook_time,
            difficulty: estimate_difficulty(&record.recipe, record.ingredients.len()),
            image: record.images.iter().find(|url| !url.trim().is_empty()).cloned(),
            ingredients,
        })
    }
}

/// Parse JSONL content, skipping blank and invalid lines
#[must_use]
pub fn parse_jsonl(content: &str) -> Vec<RecipeInput> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str::<RecipeInput>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping invalid dataset line");
                None
            }
        })
        .collect()
}

/// Read and parse a JSONL dataset file
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub async fn read_jsonl(path: &Path) -> AppResult<Vec<RecipeInput>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::invalid_input(format!("Failed to read {}: {e}", path.display()))
    })?;
    Ok(parse_jsonl(&content))
}

/// Import run settings
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Username owning the imported recipes; `None` uses the system user
    pub author: Option<String>,
    /// Replace the author's recipe with the same title instead of adding another
    pub update_existing: bool,
    /// Derive every recipe without writing anything
    pub dry_run: bool,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records read
    pub processed: usize,
    /// New recipes stored
    pub created: usize,
    /// Existing recipes replaced
    pub updated: usize,
    /// Records that failed
    pub errors: usize,
}

enum Outcome {
    Created,
    Updated,
}

/// Writes dataset records into the recipe database
pub struct Importer<'a> {
    database: &'a Database,
    options: ImportOptions,
}

impl<'a> Importer<'a> {
    /// Create an importer over `database`
    #[must_use]
    pub const fn new(database: &'a Database, options: ImportOptions) -> Self {
        Self { database, options }
    }

    /// Import every record and report the counts
    ///
    /// # Errors
    ///
    /// Returns an error if the named author does not exist or the system
    /// user cannot be created. Per-record failures are only counted.
    pub async fn run(&self, records: &[RecipeInput]) -> AppResult<ImportSummary> {
        let mut summary = ImportSummary::default();
        let author = self.resolve_author().await?;

        for record in records {
            summary.processed += 1;

            let draft = match RecipeDraft::from_record(record) {
                Ok(draft) => draft,
                Err(e) => {
                    warn!(index = record.index, error = %e.message, "Skipping dataset record");
                    summary.errors += 1;
                    continue;
                }
            };

            let Some(author) = author.as_ref() else {
                debug!(title = %draft.title, "Dry run, recipe not stored");
                continue;
            };

            match self.store(author.id, draft).await {
                Ok(Outcome::Created) => summary.created += 1,
                Ok(Outcome::Updated) => summary.updated += 1,
                Err(e) => {
                    warn!(foodname = %record.foodname, error = %e.message, "Failed to import recipe");
                    summary.errors += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            errors = summary.errors,
            dry_run = self.options.dry_run,
            "Dataset import finished"
        );
        Ok(summary)
    }

    /// Owner of imported recipes; `None` only on a dry run
    async fn resolve_author(&self) -> AppResult<Option<User>> {
        if let Some(username) = &self.options.author {
            let user = self
                .database
                .get_user_by_username(username)
                .await?
                .ok_or_else(|| AppError::not_found(format!("User '{username}'")))?;
            return Ok((!self.options.dry_run).then_some(user));
        }

        if self.options.dry_run {
            return Ok(None);
        }

        if let Some(user) = self.database.get_user_by_username(SYSTEM_USERNAME).await? {
            return Ok(Some(user));
        }

        let user = self
            .database
            .create_user(&NewUser {
                username: SYSTEM_USERNAME.to_owned(),
                email: SYSTEM_EMAIL.to_owned(),
                // Nobody knows this password, so the account cannot log in
                password_hash: hash_password(&generate_jwt_secret()).await?,
                first_name: "System".to_owned(),
                last_name: "User".to_owned(),
                student_number: None,
                role: UserRole::User,
            })
            .await?;
        info!(user_id = user.id, "Created system user for imported recipes");
        Ok(Some(user))
    }

    async fn store(&self, author_id: i64, draft: RecipeDraft) -> AppResult<Outcome> {
        let mut lines = Vec::with_capacity(draft.ingredients.len());
        for (position, ingredient) in draft.ingredients.into_iter().enumerate() {
            let (stored, _) = self.database.get_or_create_ingredient(&ingredient.name).await?;
            lines.push(RecipeIngredientInput {
                ingredient_id: stored.id,
                quantity: ingredient.quantity,
                notes: String::new(),
                order: position as i64 + 1,
            });
        }

        if self.options.update_existing {
            if let Some(existing) = self
                .database
                .find_recipe_by_title(author_id, &draft.title)
                .await?
            {
                let changes = RecipeChanges {
                    description: Some(draft.description),
                    instructions: Some(draft.instructions),
                    prep_time: Some(draft.prep_time),
                    cook_time: Some(draft.cook_time),
                    servings: Some(DEFAULT_SERVINGS),
                    difficulty: Some(draft.difficulty),
                    image: Some(draft.image),
                    is_public: Some(true),
                    ingredients: Some(lines),
                    ..RecipeChanges::default()
                };
                self.database.update_recipe(existing.id, &changes).await?;
                debug!(recipe_id = existing.id, "Updated imported recipe");
                return Ok(Outcome::Updated);
            }
        }

        let recipe = self
            .database
            .create_recipe(&NewRecipe {
                title: draft.title,
                description: draft.description,
                instructions: draft.instructions,
                prep_time: draft.prep_time,
                cook_time: draft.cook_time,
                servings: DEFAULT_SERVINGS,
                difficulty: draft.difficulty,
                image: draft.image,
                author_id,
                category_id: None,
                is_public: true,
                tag_ids: Vec::new(),
                dietary_type_ids: Vec::new(),
                ingredients: lines,
            })
            .await?;
        debug!(recipe_id = recipe.id, "Created imported recipe");
        Ok(Outcome::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(foodname: &str) -> RecipeInput {
        RecipeInput {
            foodname: foodname.to_owned(),
            ingredients: BTreeMap::from([
                ("برنج ایرانی".to_owned(), "۲ پیمانه".to_owned()),
                ("نمک".to_owned(), "  1   قاشق ".to_owned()),
            ]),
            canonical: vec!["برنج".to_owned(), "نمک".to_owned(), "زعفران".to_owned(), "نمک".to_owned()],
            recipe: vec!["  برنج را   بشویید ".to_owned(), "دم کنید".to_owned()],
            calory: None,
            taken_time: Some(vec!["60 دقیقه".to_owned()]),
            images: vec![String::new(), "https://img.example/polo.jpg".to_owned()],
            index: 1.0,
            questions: BTreeMap::new(),
        }
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a \t b\n\nc  "), "a b c");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time(None), (15, 30));
        assert_eq!(parse_time(Some(&["زیاد".to_owned()])), (15, 30));
        assert_eq!(parse_time(Some(&["60 دقیقه".to_owned()])), (20, 40));
        assert_eq!(parse_time(Some(&["10 دقیقه".to_owned(), "5دقیقه".to_owned()])), (10, 20));
        assert_eq!(parse_time(Some(&["۹۰ دقیقه".to_owned()])), (30, 60));
    }

    #[test]
    fn test_estimate_difficulty() {
        let short = vec!["a".to_owned(); 3];
        assert_eq!(estimate_difficulty(&short, 5), Difficulty::Easy);
        assert_eq!(estimate_difficulty(&short, 6), Difficulty::Medium);
        assert_eq!(estimate_difficulty(&vec!["a".to_owned(); 7], 2), Difficulty::Hard);
        assert_eq!(estimate_difficulty(&["x".repeat(1500)], 1), Difficulty::Hard);
    }

    #[test]
    fn test_match_quantity() {
        let ingredients = record("پلو").ingredients;
        assert_eq!(match_quantity("نمک", &ingredients), "1 قاشق");
        assert_eq!(match_quantity("برنج", &ingredients), "۲ پیمانه");
        assert_eq!(match_quantity("زعفران", &ingredients), DEFAULT_QUANTITY);

        let long = BTreeMap::from([("Oil".to_owned(), "x".repeat(150))]);
        assert_eq!(match_quantity("oil", &long).chars().count(), MAX_QUANTITY_LENGTH);
    }

    #[test]
    fn test_draft_from_record() {
        let draft = RecipeDraft::from_record(&record("  چلو   ساده ")).unwrap();
        assert_eq!(draft.title, "چلو ساده");
        assert_eq!(draft.description, "برنج را بشویید");
        assert_eq!(draft.instructions, "  برنج را   بشویید \nدم کنید");
        assert_eq!((draft.prep_time, draft.cook_time), (20, 40));
        assert_eq!(draft.difficulty, Difficulty::Easy);
        assert_eq!(draft.image.as_deref(), Some("https://img.example/polo.jpg"));
        let names: Vec<&str> = draft.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["برنج", "نمک", "زعفران"]);

        assert!(RecipeDraft::from_record(&record("  ")).is_err());
    }

    #[test]
    fn test_parse_jsonl_skips_invalid_lines() {
        let line = serde_json::to_string(&record("آش")).unwrap();
        let content = format!("{line}\nnot json\n\n{{\"foodname\": \"missing fields\"}}\n{line}\n");
        assert_eq!(parse_jsonl(&content).len(), 2);
    }

    #[tokio::test]
    async fn test_read_jsonl_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", serde_json::to_string(&record("کوکو")).unwrap()).unwrap();
        let records = read_jsonl(file.path()).await.unwrap();
        assert_eq!(records[0].foodname, "کوکو");

        assert!(read_jsonl(Path::new("/nonexistent/dataset.jsonl")).await.is_err());
    }

    #[tokio::test]
    async fn test_import_creates_then_updates() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let records = vec![record("چلو"), record(" "), record("آش")];

        let summary = Importer::new(&db, ImportOptions::default()).run(&records).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary { processed: 3, created: 2, updated: 0, errors: 1 }
        );

        let system = db.get_user_by_username(SYSTEM_USERNAME).await.unwrap().unwrap();
        let recipe = db.find_recipe_by_title(system.id, "چلو").await.unwrap().unwrap();
        assert!(recipe.is_public);
        let detail = db.recipe_detail(recipe.id).await.unwrap().unwrap();
        assert_eq!(detail.recipe_ingredients.len(), 3);
        assert_eq!(detail.recipe_ingredients[0].order, 1);
        assert_eq!(detail.recipe_ingredients[0].quantity, "۲ پیمانه");

        let options = ImportOptions { update_existing: true, ..ImportOptions::default() };
        let summary = Importer::new(&db, options).run(&records[..1]).await.unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.created, 0);
    }

    #[tokio::test]
    async fn test_dry_run_and_unknown_author() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let options = ImportOptions { dry_run: true, ..ImportOptions::default() };
        let summary = Importer::new(&db, options).run(&[record("چلو")]).await.unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.created, 0);
        assert!(db.get_user_by_username(SYSTEM_USERNAME).await.unwrap().is_none());

        let options = ImportOptions { author: Some("nobody".to_owned()), ..ImportOptions::default() };
        assert!(Importer::new(&db, options).run(&[record("چلو")]).await.is_err());
    }
}
