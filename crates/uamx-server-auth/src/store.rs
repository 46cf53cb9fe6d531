// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only seam onto the user-storage backend.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::types::UserAccount;

/// Lookup of local accounts by email address.
///
/// Email normalization is the backend's responsibility. Implementations must
/// return every matching account so callers can detect ambiguity.
#[async_trait]
pub trait UserStore: Send + Sync {
	async fn get_users_by_email(&self, email: &str) -> Result<Vec<UserAccount>, StoreError>;
}

/// In-process store matching emails case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
	users: RwLock<Vec<UserAccount>>,
}

impl InMemoryUserStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_users(users: impl IntoIterator<Item = UserAccount>) -> Self {
		Self {
			users: RwLock::new(users.into_iter().collect()),
		}
	}

	pub async fn insert(&self, user: UserAccount) {
		self.users.write().await.push(user);
	}
}

#[async_trait]
impl UserStore for InMemoryUserStore {
	async fn get_users_by_email(&self, email: &str) -> Result<Vec<UserAccount>, StoreError> {
		let users = self.users.read().await;
		Ok(users
			.iter()
			.filter(|u| u.email.eq_ignore_ascii_case(email))
			.cloned()
			.collect())
	}
}
