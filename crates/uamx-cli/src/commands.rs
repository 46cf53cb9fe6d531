// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand execution.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use uamx_server_auth::{
	AuthAttempt, EmailAssociator, InMemoryUserStore, LoginGuard, PolicyConfig, PolicyDecision,
	PolicyError, RegistrationForm, RegistrationGuard, UserAccount, UserDetails, UserStore,
};
use uamx_server_db::{create_pool, SqliteUserStore};

use crate::args::{AssociateArgs, CheckLoginArgs, Command};

/// Result of running one hook.
#[derive(Debug)]
pub enum Outcome {
	Passed(PolicyDecision),
	Rejected(PolicyError),
}

impl Outcome {
	fn from_result(result: Result<PolicyDecision, PolicyError>) -> anyhow::Result<Self> {
		match result {
			Ok(decision) => Ok(Outcome::Passed(decision)),
			// A failing store is an operational problem, not a policy outcome.
			Err(PolicyError::Store(e)) => Err(e).context("user store lookup failed"),
			Err(e) => Ok(Outcome::Rejected(e)),
		}
	}

	/// Human-readable single-line summary.
	pub fn render_text(&self) -> String {
		match self {
			Outcome::Passed(PolicyDecision::NoOpinion) => "pass: no opinion".to_string(),
			Outcome::Passed(PolicyDecision::Empty) => "pass: nothing to block".to_string(),
			Outcome::Passed(PolicyDecision::Merge(partial)) => format!(
				"pass: associate with user {} ({}), is_new={}",
				partial.user.username, partial.user.id, partial.is_new
			),
			Outcome::Rejected(err) => format!(
				"rejected [{} {}]: {}",
				err.status().as_u16(),
				err.error_code(),
				err
			),
		}
	}

	/// JSON rendering: the context mapping on pass, the error payload on rejection.
	pub fn render_json(self) -> anyhow::Result<String> {
		let value = match self {
			Outcome::Passed(decision) => match decision.into_context()? {
				Some(map) => serde_json::Value::Object(map),
				None => serde_json::Value::Null,
			},
			Outcome::Rejected(err) => serde_json::to_value(err.payload())?,
		};
		Ok(serde_json::to_string_pretty(&value)?)
	}
}

pub async fn run(command: &Command, policy: &PolicyConfig) -> anyhow::Result<Outcome> {
	match command {
		Command::CheckRegistration { email } => {
			let guard = RegistrationGuard::new(policy.clone())?;
			Outcome::from_result(guard.check(&RegistrationForm::new(email.clone())))
		}
		Command::CheckLogin(args) => check_login(args, policy),
		Command::Associate(args) => associate(args, policy).await,
	}
}

fn check_login(args: &CheckLoginArgs, policy: &PolicyConfig) -> anyhow::Result<Outcome> {
	let guard = LoginGuard::new(policy.clone())?;
	let user = match (&args.email, args.anonymous) {
		(_, true) | (None, _) => None,
		(Some(email), false) => Some(UserAccount::new("cli", email.clone())),
	};
	Outcome::from_result(guard.check(user.as_ref()))
}

async fn associate(args: &AssociateArgs, policy: &PolicyConfig) -> anyhow::Result<Outcome> {
	let store: Arc<dyn UserStore> = match (&args.database_url, &args.users_file) {
		(Some(url), _) => {
			let pool = create_pool(url)
				.await
				.with_context(|| format!("failed to open database {url}"))?;
			Arc::new(SqliteUserStore::new(pool))
		}
		(None, Some(path)) => Arc::new(load_users_file(path)?),
		(None, None) => anyhow::bail!("either --database-url or --users-file is required"),
	};

	let details = match &args.email {
		Some(email) => UserDetails::with_email(email.clone()),
		None => UserDetails::default(),
	};
	let mut attempt = AuthAttempt::new(args.backend.clone(), details);
	if args.resolved {
		let email = args.email.clone().unwrap_or_default();
		attempt = attempt.with_user(UserAccount::new("resolved", email));
	}

	let associator = EmailAssociator::new(store, policy);
	Outcome::from_result(associator.associate(&attempt).await)
}

fn load_users_file(path: &Path) -> anyhow::Result<InMemoryUserStore> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read users file {}", path.display()))?;
	let users: Vec<UserAccount> = serde_json::from_str(&content)
		.with_context(|| format!("failed to parse users file {}", path.display()))?;
	tracing::debug!(count = users.len(), "loaded users file");
	Ok(InMemoryUserStore::with_users(users))
}
