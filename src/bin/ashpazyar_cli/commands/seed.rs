// ABOUTME: Demo data command for ashpazyar-cli
// ABOUTME: Runs the seeder with an entropy-seeded generator and prints the counts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use ashpazyar_server::{
    constants::seed::DEMO_PASSWORD,
    database::Database,
    errors::AppResult,
    seed::{SeedOptions, Seeder},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::helpers::display::display_seed_summary;

/// Generate demo data and print what was created
pub async fn run(database: &Database, options: SeedOptions) -> AppResult<()> {
    info!(
        "Seeding {} users, {} recipes, up to {} ingredients",
        options.users, options.recipes, options.ingredients
    );
    let mut rng = StdRng::from_entropy();
    let summary = Seeder::new(database, options).run(&mut rng).await?;
    display_seed_summary(&summary, DEMO_PASSWORD);
    Ok(())
}
