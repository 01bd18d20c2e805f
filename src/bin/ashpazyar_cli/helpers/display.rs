// ABOUTME: Output formatting helpers for ashpazyar-cli
// ABOUTME: Prints created accounts, dataset run summaries, and seeding counts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use ashpazyar_server::{importer::ImportSummary, models::User, seed::SeedSummary};

/// Display account creation success message
pub fn display_user_created(user: &User) {
    println!("\nUser created");
    println!("{}", "=".repeat(60));
    println!("   ID:       {}", user.id);
    println!("   Username: {}", user.username);
    println!("   Email:    {}", user.email);
    println!("   Role:     {}", user.role.as_str());
    println!("{}", "=".repeat(60));
    println!("Log in with POST /api/auth/jwt/create/");
}

/// Display the counts of an import run
pub fn display_import_summary(summary: &ImportSummary, dry_run: bool) {
    let heading = if dry_run { "Dry run complete" } else { "Import complete" };
    println!("\n{heading}");
    println!("{}", "=".repeat(60));
    println!("   Processed: {}", summary.processed);
    println!("   Created:   {}", summary.created);
    println!("   Updated:   {}", summary.updated);
    println!("   Errors:    {}", summary.errors);
    println!("{}", "=".repeat(60));
}

/// Display the outcome of a vector push
pub fn display_push_summary(sent: usize, failed: usize) {
    println!("\nVector push complete");
    println!("   Sent:   {sent}");
    println!("   Failed: {failed}");
}

/// Display the rows created by a seeding run
pub fn display_seed_summary(summary: &SeedSummary, password: &str) {
    println!("\nDemo data generated");
    println!("{}", "=".repeat(60));
    println!("   Users:         {}", summary.users);
    println!("   Categories:    {}", summary.categories);
    println!("   Tags:          {}", summary.tags);
    println!("   Dietary types: {}", summary.dietary_types);
    println!("   Ingredients:   {}", summary.ingredients);
    println!("   Recipes:       {}", summary.recipes);
    println!("   Ratings:       {}", summary.ratings);
    println!("   Bookmarks:     {}", summary.bookmarks);
    println!("   History:       {}", summary.history);
    println!("{}", "=".repeat(60));
    println!("Demo accounts use the password '{password}'");
}
