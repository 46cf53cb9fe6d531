// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for exercising the store against an in-memory database.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use uamx_server_auth::UserAccount;

use crate::error::DbError;

/// Single-connection pool over `:memory:` so every query sees the same database.
pub async fn create_test_pool() -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(":memory:")?.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await?;
	Ok(pool)
}

pub async fn create_users_table(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS users (
			id TEXT PRIMARY KEY,
			username TEXT NOT NULL UNIQUE,
			email TEXT NOT NULL,
			is_staff INTEGER NOT NULL DEFAULT 0,
			is_superuser INTEGER NOT NULL DEFAULT 0,
			is_active INTEGER NOT NULL DEFAULT 1
		)
		"#,
	)
	.execute(pool)
	.await?;
	Ok(())
}

pub async fn insert_user(pool: &SqlitePool, user: &UserAccount) -> Result<(), DbError> {
	sqlx::query(
		r#"
		INSERT INTO users (id, username, email, is_staff, is_superuser, is_active)
		VALUES (?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(user.id.to_string())
	.bind(&user.username)
	.bind(&user.email)
	.bind(user.is_staff)
	.bind(user.is_superuser)
	.bind(user.is_active)
	.execute(pool)
	.await?;
	Ok(())
}
