// ABOUTME: User management commands for ashpazyar-cli
// ABOUTME: Creates regular or admin accounts directly in the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use ashpazyar_server::{
    auth::{hash_password, validate_password_strength},
    database::Database,
    errors::{AppError, AppResult},
    models::{NewUser, UserRole},
    routes::auth::is_valid_email,
};
use tracing::info;

use crate::helpers::display::display_user_created;

/// Arguments of `user create`
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
}

/// Create an account, failing if the username is taken
pub async fn create(database: &Database, args: CreateUser) -> AppResult<()> {
    let username = args.username.trim();
    if username.is_empty() {
        return Err(AppError::missing_field("username"));
    }
    if !is_valid_email(&args.email) {
        return Err(AppError::invalid_input("Enter a valid email address."));
    }
    validate_password_strength(&args.password)?;

    if database.get_user_by_username(username).await?.is_some() {
        return Err(AppError::already_exists(format!(
            "A user with username '{username}' already exists"
        )));
    }

    let role = if args.admin { UserRole::Admin } else { UserRole::User };
    info!("Creating {} user: {username}", role.as_str());

    let user = database
        .create_user(&NewUser {
            username: username.to_owned(),
            email: args.email.trim().to_owned(),
            password_hash: hash_password(&args.password).await?,
            first_name: args.first_name,
            last_name: args.last_name,
            student_number: None,
            role,
        })
        .await?;

    display_user_created(&user);
    Ok(())
}
