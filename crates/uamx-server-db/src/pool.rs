// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::DbError;

/// Open a read-only pool over an existing user database.
///
/// The hooks never write, and a missing file is an error rather than a fresh
/// empty database.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./users.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid, `DbError::Sqlx` if the
/// database cannot be opened.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.read_only(true)
		.create_if_missing(false);

	let pool = SqlitePoolOptions::new()
		.max_connections(4)
		.connect_with(options)
		.await?;

	tracing::debug!("read-only user database pool created");
	Ok(pool)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn invalid_url_options_are_internal_error() {
		let err = create_pool("sqlite:users.db?mode=bogus").await.unwrap_err();
		assert!(matches!(err, DbError::Internal(_)));
	}

	#[tokio::test]
	async fn missing_database_is_not_created() {
		let dir = std::env::temp_dir().join(format!("uamx-missing-{}", uuid::Uuid::new_v4()));
		let url = format!("sqlite:{}", dir.join("users.db").display());

		assert!(create_pool(&url).await.is_err());
		assert!(!dir.exists());
	}
}
