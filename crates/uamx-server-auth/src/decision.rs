// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hook outcomes as the pipeline runner sees them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::UserAccount;

/// Partial pipeline state produced by a successful association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
	pub user: UserAccount,
	pub is_new: bool,
}

/// Non-failing result of a hook.
///
/// Rejections are not a variant: they travel as the `Err` arm of
/// `Result<PolicyDecision, PolicyError>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
	/// The hook has nothing to say; the runner continues unchanged.
	NoOpinion,
	/// The hook ran and found nothing to act on (an explicit empty mapping).
	Empty,
	/// Values to merge into the shared pipeline context.
	Merge(PartialResult),
}

impl PolicyDecision {
	/// Associate the attempt with an existing, non-new account.
	pub fn existing_user(user: UserAccount) -> Self {
		Self::Merge(PartialResult {
			user,
			is_new: false,
		})
	}

	pub fn is_no_opinion(&self) -> bool {
		matches!(self, Self::NoOpinion)
	}

	/// The associated account, if this decision carries one.
	pub fn user(&self) -> Option<&UserAccount> {
		match self {
			Self::Merge(partial) => Some(&partial.user),
			_ => None,
		}
	}

	/// Render the decision as the mapping the runner merges into its context.
	///
	/// `NoOpinion` yields `None`, `Empty` an empty map.
	pub fn into_context(self) -> Result<Option<Map<String, Value>>, serde_json::Error> {
		match self {
			Self::NoOpinion => Ok(None),
			Self::Empty => Ok(Some(Map::new())),
			Self::Merge(partial) => match serde_json::to_value(partial)? {
				Value::Object(map) => Ok(Some(map)),
				_ => Ok(Some(Map::new())),
			},
		}
	}
}
