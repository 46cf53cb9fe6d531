// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User repository backing the email associator.
//!
//! Reads the `users` table only. Accounts are created and maintained by the
//! host platform.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, sqlite::SqliteRow, Row};
use uamx_server_auth::{StoreError, UserAccount, UserId, UserStore};
use uuid::Uuid;

use crate::error::DbError;

#[async_trait]
impl UserStore for SqliteUserStore {
	async fn get_users_by_email(&self, email: &str) -> Result<Vec<UserAccount>, StoreError> {
		Ok(self.get_users_by_email(email).await?)
	}
}

/// Repository for user lookups.
#[derive(Clone)]
pub struct SqliteUserStore {
	pool: SqlitePool,
}

impl SqliteUserStore {
	/// Create a new user store with the given pool.
	///
	/// # Arguments
	/// * `pool` - SQLite connection pool
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Get every account whose email matches, ignoring ASCII case.
	///
	/// Duplicates are returned as-is so the caller can detect ambiguity.
	#[tracing::instrument(skip(self))]
	pub async fn get_users_by_email(&self, email: &str) -> Result<Vec<UserAccount>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, username, email, is_staff, is_superuser, is_active
			FROM users
			WHERE email = ? COLLATE NOCASE
			ORDER BY username
			"#,
		)
		.bind(email)
		.fetch_all(&self.pool)
		.await?;

		tracing::debug!(matches = rows.len(), "looked up users by email");
		rows.iter().map(row_to_user).collect()
	}
}

fn row_to_user(row: &SqliteRow) -> Result<UserAccount, DbError> {
	let id: String = row.try_get("id")?;
	let uuid = Uuid::parse_str(&id)
		.map_err(|e| DbError::InvalidRecord(format!("user id '{id}': {e}")))?;

	Ok(UserAccount {
		id: UserId::new(uuid),
		username: row.try_get("username")?,
		email: row.try_get("email")?,
		is_staff: row.try_get("is_staff")?,
		is_superuser: row.try_get("is_superuser")?,
		is_active: row.try_get("is_active")?,
	})
}
