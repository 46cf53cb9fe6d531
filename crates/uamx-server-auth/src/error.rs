// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rejection types raised by the hooks and the payload the runner surfaces.

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Error code for an email shared by several local accounts.
pub const AMBIGUOUS_IDENTITY_ERROR_CODE: &str = "uamx__ambiguous-email-association";
/// Error code for a refused auto-association of a staff or superuser account.
pub const PRIVILEGED_ASSOCIATION_ERROR_CODE: &str = "uamx__privileged-association-forbidden";
/// Error code for a failing user-storage backend.
pub const STORE_UNAVAILABLE_ERROR_CODE: &str = "uamx__user-store-unavailable";

/// Failure reported by a [`UserStore`](crate::UserStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("User store backend error: {0}")]
	Backend(String),

	#[error("Invalid stored record: {0}")]
	InvalidRecord(String),
}

/// A terminal rejection of the current authentication attempt.
///
/// Every variant aborts the enclosing pipeline; none is retried.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
	#[error("The given email address is associated with more than one account")]
	AmbiguousIdentity { backend: String, matches: usize },

	#[error("It is not allowed to auto associate staff or admin users")]
	PrivilegedAssociation { backend: String },

	#[error("{message}")]
	RegistrationBlocked {
		message: String,
		status_code: u16,
		error_code: String,
	},

	#[error("{message}")]
	LoginBlocked {
		message: String,
		status_code: u16,
		error_code: String,
		redirect_to: String,
	},

	#[error(transparent)]
	Store(#[from] StoreError),
}

impl PolicyError {
	/// HTTP status the runner should answer with.
	pub fn status(&self) -> StatusCode {
		match self {
			PolicyError::AmbiguousIdentity { .. } => StatusCode::CONFLICT,
			PolicyError::PrivilegedAssociation { .. } => StatusCode::FORBIDDEN,
			PolicyError::RegistrationBlocked { status_code, .. }
			| PolicyError::LoginBlocked { status_code, .. } => {
				StatusCode::from_u16(*status_code).unwrap_or(StatusCode::FORBIDDEN)
			}
			PolicyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Stable machine-readable code for client-side handling.
	pub fn error_code(&self) -> &str {
		match self {
			PolicyError::AmbiguousIdentity { .. } => AMBIGUOUS_IDENTITY_ERROR_CODE,
			PolicyError::PrivilegedAssociation { .. } => PRIVILEGED_ASSOCIATION_ERROR_CODE,
			PolicyError::RegistrationBlocked { error_code, .. }
			| PolicyError::LoginBlocked { error_code, .. } => error_code,
			PolicyError::Store(_) => STORE_UNAVAILABLE_ERROR_CODE,
		}
	}

	pub fn payload(&self) -> ErrorPayload {
		let redirect_to = match self {
			PolicyError::LoginBlocked { redirect_to, .. } => Some(redirect_to.clone()),
			_ => None,
		};

		ErrorPayload {
			message: self.to_string(),
			status_code: self.status().as_u16(),
			error_code: self.error_code().to_string(),
			redirect_to,
		}
	}
}

/// Body surfaced to the caller when a hook rejects an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	pub status_code: u16,
	pub error_code: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirect_to: Option<String>,
}
