// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use uamx_server_auth::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Invalid record: {0}")]
	InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for StoreError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::InvalidRecord(msg) => StoreError::InvalidRecord(msg),
			other => StoreError::Backend(other.to_string()),
		}
	}
}
