// ABOUTME: Ashpazyar CLI for administrative tasks against the recipe database
// ABOUTME: Creates users, imports or seeds recipes, and pushes records to the vector server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors
//!
//! Usage:
//! ```bash
//! # Create an admin account
//! ashpazyar-cli user create --username chef --email chef@example.com --password secret123 --admin
//!
//! # Import the scraped dataset as the system user
//! ashpazyar-cli import data/recipes.jsonl
//!
//! # Re-import, replacing recipes that already exist for the author
//! ashpazyar-cli import data/recipes.jsonl --author chef --update-existing
//!
//! # Check a dataset without writing anything
//! ashpazyar-cli import data/recipes.jsonl --dry-run
//!
//! # Embed the dataset into the vector server
//! ashpazyar-cli vectors push data/recipes.jsonl --batch-size 4
//!
//! # Fill a development database with demo users and recipes
//! ashpazyar-cli seed --users 10 --recipes 30
//! ```

mod commands;
mod helpers;

use ashpazyar_server::{
    constants::{
        database::DEFAULT_DATABASE_URL,
        dataset::DEFAULT_PUSH_BATCH_SIZE,
        seed::{DEFAULT_INGREDIENTS, DEFAULT_RECIPES, DEFAULT_USERS},
    },
    database::Database,
    errors::AppResult,
    seed::SeedOptions,
};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use tracing::info;

type Result<T> = AppResult<T>;

#[derive(Parser)]
#[command(
    name = "ashpazyar-cli",
    about = "Ashpazyar administration CLI",
    long_about = "Command-line tool for managing Ashpazyar users and loading the recipe dataset."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// User management commands
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Import a JSONL dataset into the recipe database
    Import {
        /// Dataset file, one record per line
        path: PathBuf,

        /// Username owning the recipes (defaults to the system user)
        #[arg(long)]
        author: Option<String>,

        /// Replace the author's recipes that have the same title
        #[arg(long)]
        update_existing: bool,

        /// Parse and derive recipes without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Vector server commands
    Vectors {
        #[command(subcommand)]
        action: VectorsCommand,
    },

    /// Generate demo users, catalog entries, and recipes
    Seed {
        /// Demo accounts to create
        #[arg(long, default_value_t = DEFAULT_USERS)]
        users: usize,

        /// Recipes to create
        #[arg(long, default_value_t = DEFAULT_RECIPES)]
        recipes: usize,

        /// Ingredients to create
        #[arg(long, default_value_t = DEFAULT_INGREDIENTS)]
        ingredients: usize,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create a new account
    Create {
        /// Login name
        #[arg(long)]
        username: String,

        /// Contact email
        #[arg(long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(long)]
        password: String,

        /// Given name
        #[arg(long, default_value = "")]
        first_name: String,

        /// Family name
        #[arg(long, default_value = "")]
        last_name: String,

        /// Grant catalog write access
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand)]
enum VectorsCommand {
    /// Post dataset records to the vector server's `/insert`
    Push {
        /// Dataset file, one record per line
        path: PathBuf,

        /// Records per request
        #[arg(long, default_value_t = DEFAULT_PUSH_BATCH_SIZE)]
        batch_size: usize,

        /// Vector server URL (defaults to `VECTOR_SERVER_URL`)
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    info!("Ashpazyar CLI");

    match cli.command {
        Command::User {
            action:
                UserCommand::Create {
                    username,
                    email,
                    password,
                    first_name,
                    last_name,
                    admin,
                },
        } => {
            let database = open_database(cli.database_url).await?;
            let args = commands::user::CreateUser {
                username,
                email,
                password,
                first_name,
                last_name,
                admin,
            };
            commands::user::create(&database, args).await
        }
        Command::Import {
            path,
            author,
            update_existing,
            dry_run,
        } => {
            let database = open_database(cli.database_url).await?;
            commands::dataset::import(&database, &path, author, update_existing, dry_run).await
        }
        Command::Vectors {
            action:
                VectorsCommand::Push {
                    path,
                    batch_size,
                    url,
                },
        } => commands::dataset::push_vectors(&path, batch_size, url).await,
        Command::Seed {
            users,
            recipes,
            ingredients,
        } => {
            let database = open_database(cli.database_url).await?;
            let options = SeedOptions {
                users,
                recipes,
                ingredients,
            };
            commands::seed::run(&database, options).await
        }
    }
}

async fn open_database(database_url: Option<String>) -> Result<Database> {
    let database_url = database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
    info!("Connecting to database: {database_url}");
    Database::new(&database_url).await
}
