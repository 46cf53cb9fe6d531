// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-scoped context records handed to the hooks by the pipeline runner.
//!
//! The host pipeline passes a loosely-shaped bag of arguments to every step.
//! Here the fields the hooks read are named and typed, and everything else is
//! carried through untouched in an opaque JSON map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::UserAccount;

/// User details reported by the social-auth backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
	#[serde(default)]
	pub email: Option<String>,
	/// Remaining provider fields (`fullname`, `username`, ...).
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl UserDetails {
	pub fn with_email(email: impl Into<String>) -> Self {
		Self {
			email: Some(email.into()),
			extra: Map::new(),
		}
	}

	/// The reported email, or `None` when absent or empty.
	pub fn email(&self) -> Option<&str> {
		self.email.as_deref().filter(|e| !e.is_empty())
	}
}

/// An in-flight social login or registration attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthAttempt {
	/// Name of the social-auth backend driving this attempt (e.g. `google-oauth2`).
	pub backend: String,
	pub details: UserDetails,
	/// Account already resolved by an earlier pipeline step, if any.
	#[serde(default)]
	pub user: Option<UserAccount>,
	#[serde(flatten)]
	pub extensions: Map<String, Value>,
}

impl AuthAttempt {
	pub fn new(backend: impl Into<String>, details: UserDetails) -> Self {
		Self {
			backend: backend.into(),
			details,
			user: None,
			extensions: Map::new(),
		}
	}

	pub fn with_user(mut self, user: UserAccount) -> Self {
		self.user = Some(user);
		self
	}
}

/// Form data submitted on the registration endpoint.
///
/// `email` is required; the caller validates the form before the guard runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationForm {
	pub email: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl RegistrationForm {
	pub fn new(email: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			extra: Map::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn empty_email_is_treated_as_missing() {
		let details = UserDetails::with_email("");
		assert_eq!(details.email(), None);
		assert_eq!(UserDetails::default().email(), None);
	}

	#[test]
	fn unknown_attempt_fields_land_in_extensions() {
		let attempt: AuthAttempt = serde_json::from_value(json!({
			"backend": "google-oauth2",
			"details": {"email": "x@example.com", "fullname": "X"},
			"is_new": true,
			"uid": "1234"
		}))
		.unwrap();

		assert_eq!(attempt.details.email(), Some("x@example.com"));
		assert_eq!(attempt.details.extra.get("fullname"), Some(&json!("X")));
		assert_eq!(attempt.extensions.get("uid"), Some(&json!("1234")));
		assert!(attempt.user.is_none());
	}

	#[test]
	fn registration_form_keeps_other_fields() {
		let form: RegistrationForm = serde_json::from_value(json!({
			"email": "a@example.com",
			"name": "A",
			"honor_code": true
		}))
		.unwrap();
		assert_eq!(form.email, "a@example.com");
		assert_eq!(form.extra.len(), 2);
	}
}
