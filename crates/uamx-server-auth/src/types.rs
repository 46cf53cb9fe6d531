// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared by the policy hooks.
//!
//! - [`UserId`]: type-safe wrapper around the account UUID
//! - [`UserAccount`]: read-only view of a local account as returned by a
//!   [`UserStore`](crate::UserStore)

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a local user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
	/// Create a new ID from a UUID.
	pub fn new(id: Uuid) -> Self {
		Self(id)
	}

	/// Generate a new random ID.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<Uuid> for UserId {
	fn from(id: Uuid) -> Self {
		Self(id)
	}
}

impl From<UserId> for Uuid {
	fn from(id: UserId) -> Self {
		id.0
	}
}

/// A local account known to the user-storage backend.
///
/// The hooks never create or mutate accounts. They only read them and, on
/// association, hand a copy back to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
	pub id: UserId,
	pub username: String,
	pub email: String,
	#[serde(default)]
	pub is_staff: bool,
	#[serde(default)]
	pub is_superuser: bool,
	#[serde(default = "default_active")]
	pub is_active: bool,
}

fn default_active() -> bool {
	true
}

impl UserAccount {
	/// Create an active, non-privileged account with a random ID.
	pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
		Self {
			id: UserId::generate(),
			username: username.into(),
			email: email.into(),
			is_staff: false,
			is_superuser: false,
			is_active: true,
		}
	}

	/// Returns true if the account carries staff or superuser privileges.
	pub fn is_privileged(&self) -> bool {
		self.is_staff || self.is_superuser
	}
}
