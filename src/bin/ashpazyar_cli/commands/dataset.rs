// ABOUTME: Dataset commands for ashpazyar-cli
// ABOUTME: Imports JSONL records into the database and pushes them to the vector server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use ashpazyar_server::{
    config::VectorClientConfig,
    constants::vector::DEFAULT_SERVER_URL,
    database::Database,
    errors::{AppError, AppResult},
    importer::{read_jsonl, ImportOptions, Importer},
    search_client::RecipeSearchClient,
};
use std::env;
use std::path::Path;
use tracing::{error, info};

use crate::helpers::display::{display_import_summary, display_push_summary};

/// Import a dataset file and print the counts
pub async fn import(
    database: &Database,
    path: &Path,
    author: Option<String>,
    update_existing: bool,
    dry_run: bool,
) -> AppResult<()> {
    let records = read_jsonl(path).await?;
    info!("Read {} records from {}", records.len(), path.display());

    let options = ImportOptions {
        author,
        update_existing,
        dry_run,
    };
    let summary = Importer::new(database, options).run(&records).await?;
    display_import_summary(&summary, dry_run);
    Ok(())
}

/// Send a dataset file to the vector server in batches
///
/// A failed batch is reported and the push continues with the next one.
pub async fn push_vectors(path: &Path, batch_size: usize, url: Option<String>) -> AppResult<()> {
    if batch_size == 0 {
        return Err(AppError::invalid_input("--batch-size must be at least 1"));
    }

    let config = VectorClientConfig {
        url: url
            .or_else(|| env::var("VECTOR_SERVER_URL").ok())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_owned()),
        access_token: env::var("VECTOR_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()),
    };
    let client = RecipeSearchClient::new(&config)?;

    let records = read_jsonl(path).await?;
    info!(
        "Pushing {} records to {} in batches of {batch_size}",
        records.len(),
        config.url
    );

    let mut sent = 0;
    let mut failed = 0;
    for (number, batch) in records.chunks(batch_size).enumerate() {
        match client.insert(batch.to_vec()).await {
            Ok(message) => {
                sent += batch.len();
                info!("Batch {}: {message}", number + 1);
            }
            Err(e) => {
                failed += batch.len();
                error!("Batch {} failed: {}", number + 1, e.message);
            }
        }
    }

    display_push_summary(sent, failed);
    Ok(())
}
