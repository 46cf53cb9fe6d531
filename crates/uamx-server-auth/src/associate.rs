// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permissive association of a social-auth identity with an existing account.
//!
//! When a provider reports an email that belongs to exactly one local account,
//! the attempt is attached to that account instead of creating a new one. This
//! favors frictionless cross-provider login over verified email ownership and
//! is only enabled for trusted tenants.
//!
//! Ambiguous matches are never resolved automatically: two or more accounts
//! sharing an address abort the attempt until the accounts are cleaned up.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::PolicyConfig;
use crate::context::AuthAttempt;
use crate::decision::PolicyDecision;
use crate::error::PolicyError;
use crate::store::UserStore;

/// Pipeline step associating attempts with accounts by email.
#[derive(Clone)]
pub struct EmailAssociator {
	store: Arc<dyn UserStore>,
	deny_privileged: bool,
}

impl EmailAssociator {
	pub fn new(store: Arc<dyn UserStore>, policy: &PolicyConfig) -> Self {
		Self {
			store,
			deny_privileged: policy.deny_privileged_association,
		}
	}

	/// Associate `attempt` with the single account sharing its email.
	///
	/// # Returns
	///
	/// - `NoOpinion` if a user is already resolved, the email is missing, or
	///   no account matches
	/// - `Merge({user, is_new: false})` on exactly one match
	///
	/// # Errors
	///
	/// - [`PolicyError::AmbiguousIdentity`] when several accounts match
	/// - [`PolicyError::PrivilegedAssociation`] when the match is staff or
	///   superuser and `deny_privileged_association` is set
	/// - [`PolicyError::Store`] when the lookup fails
	#[instrument(
		skip(self, attempt),
		fields(backend = %attempt.backend, email = ?attempt.details.email())
	)]
	pub async fn associate(&self, attempt: &AuthAttempt) -> Result<PolicyDecision, PolicyError> {
		if attempt.user.is_some() {
			debug!("user already resolved, skipping association");
			return Ok(PolicyDecision::NoOpinion);
		}

		let Some(email) = attempt.details.email() else {
			debug!("no email in details, skipping association");
			return Ok(PolicyDecision::NoOpinion);
		};

		let mut users = self.store.get_users_by_email(email).await?;

		match users.len() {
			0 => {
				debug!("no account matches email");
				Ok(PolicyDecision::NoOpinion)
			}
			1 => {
				let user = users.remove(0);
				if self.deny_privileged && user.is_privileged() {
					warn!(user_id = %user.id, "refusing to auto-associate privileged account");
					return Err(PolicyError::PrivilegedAssociation {
						backend: attempt.backend.clone(),
					});
				}
				info!(user_id = %user.id, "associated attempt with existing account");
				Ok(PolicyDecision::existing_user(user))
			}
			matches => {
				warn!(matches, "email shared by multiple accounts");
				Err(PolicyError::AmbiguousIdentity {
					backend: attempt.backend.clone(),
					matches,
				})
			}
		}
	}
}
