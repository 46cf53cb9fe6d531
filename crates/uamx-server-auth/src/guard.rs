// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Guards that stop reserved-domain users from logging in or registering
//! locally. Those users must authenticate through the institutional IdP.

use tracing::{instrument, warn};

use crate::config::{ConfigError, PolicyConfig};
use crate::context::RegistrationForm;
use crate::decision::PolicyDecision;
use crate::error::PolicyError;
use crate::types::UserAccount;

/// Rejects registrations whose email ends with the reserved suffix.
#[derive(Debug, Clone)]
pub struct RegistrationGuard {
	policy: PolicyConfig,
}

impl RegistrationGuard {
	/// Fails if `policy` does not pass [`PolicyConfig::validate`].
	pub fn new(policy: PolicyConfig) -> Result<Self, ConfigError> {
		policy.validate()?;
		Ok(Self { policy })
	}

	#[instrument(skip(self, form), fields(email = %form.email))]
	pub fn check(&self, form: &RegistrationForm) -> Result<PolicyDecision, PolicyError> {
		if self.policy.is_reserved_email(&form.email) {
			warn!(
				suffix = %self.policy.reserved_suffix,
				"registration blocked for reserved domain"
			);
			return Err(PolicyError::RegistrationBlocked {
				message: self.policy.registration_message.clone(),
				status_code: self.policy.status_code,
				error_code: self.policy.registration_error_code.clone(),
			});
		}
		Ok(PolicyDecision::NoOpinion)
	}
}

/// Rejects logins of resolved users whose email ends with the reserved suffix.
#[derive(Debug, Clone)]
pub struct LoginGuard {
	policy: PolicyConfig,
}

impl LoginGuard {
	/// Fails if `policy` does not pass [`PolicyConfig::validate`].
	pub fn new(policy: PolicyConfig) -> Result<Self, ConfigError> {
		policy.validate()?;
		Ok(Self { policy })
	}

	/// Returns [`PolicyDecision::Empty`] when nothing is blocked, including
	/// when no user has been resolved.
	#[instrument(skip(self, user), fields(email = ?user.map(|u| u.email.as_str())))]
	pub fn check(&self, user: Option<&UserAccount>) -> Result<PolicyDecision, PolicyError> {
		match user {
			Some(user) if self.policy.is_reserved_email(&user.email) => {
				warn!(
					suffix = %self.policy.reserved_suffix,
					"login blocked for reserved domain"
				);
				Err(PolicyError::LoginBlocked {
					message: self.policy.login_message.clone(),
					status_code: self.policy.status_code,
					error_code: self.policy.login_error_code.clone(),
					redirect_to: self.policy.login_redirect_to.clone(),
				})
			}
			_ => Ok(PolicyDecision::Empty),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::sync::{Arc, Mutex};
	use tracing::field::{Field, Visit};
	use tracing::span::{Attributes, Id};
	use tracing_subscriber::layer::{Context, SubscriberExt};
	use tracing_subscriber::Layer;

	#[derive(Clone, Default)]
	struct SpanFields(Arc<Mutex<Vec<(String, String)>>>);

	impl Visit for SpanFields {
		fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
			self
				.0
				.lock()
				.unwrap()
				.push((field.name().to_string(), format!("{value:?}")));
		}
	}

	impl<S: tracing::Subscriber> Layer<S> for SpanFields {
		fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
			attrs.record(&mut self.clone());
		}
	}

	fn registration() -> RegistrationGuard {
		RegistrationGuard::new(PolicyConfig::default()).unwrap()
	}

	fn login() -> LoginGuard {
		LoginGuard::new(PolicyConfig::default()).unwrap()
	}

	#[test]
	fn reserved_registration_is_forbidden() {
		let err = registration()
			.check(&RegistrationForm::new("a@uam.es"))
			.unwrap_err();

		let payload = err.payload();
		assert_eq!(payload.status_code, 403);
		assert_eq!(payload.error_code, "uamx__uam-domain-register-forbidden");
		assert_eq!(
			payload.message,
			"You can't register. UAM users should use ID-UAM."
		);
		assert_eq!(payload.redirect_to, None);
	}

	#[test]
	fn other_registrations_pass() {
		let decision = registration()
			.check(&RegistrationForm::new("a@example.com"))
			.unwrap();
		assert!(decision.is_no_opinion());
	}

	#[test]
	fn uppercase_domain_is_not_reserved() {
		assert!(registration()
			.check(&RegistrationForm::new("a@UAM.ES"))
			.is_ok());
	}

	#[test]
	fn suffix_match_is_not_a_domain_match() {
		let reg = registration()
			.check(&RegistrationForm::new("x@notuam.es"))
			.unwrap_err();
		assert_eq!(reg.error_code(), "uamx__uam-domain-register-forbidden");

		let user = UserAccount::new("x", "x@notuam.es");
		let log = login().check(Some(&user)).unwrap_err();
		assert_eq!(log.error_code(), "uamx__uam-domain-login-forbidden");
	}

	#[test]
	fn check_spans_record_the_email() {
		let fields = SpanFields::default();
		let subscriber = tracing_subscriber::registry().with(fields.clone());

		tracing::subscriber::with_default(subscriber, || {
			let _ = registration().check(&RegistrationForm::new("a@uam.es"));
			let user = UserAccount::new("c", "c@example.com");
			let _ = login().check(Some(&user));
		});

		let recorded = fields.0.lock().unwrap().clone();
		let emails: Vec<_> = recorded
			.iter()
			.filter(|(name, _)| name == "email")
			.map(|(_, value)| value.as_str())
			.collect();
		assert_eq!(emails, vec!["a@uam.es", "Some(\"c@example.com\")"]);
	}

	#[test]
	fn invalid_policy_is_refused() {
		let policy = PolicyConfig {
			reserved_suffix: String::new(),
			..PolicyConfig::default()
		};
		assert!(matches!(
			RegistrationGuard::new(policy.clone()),
			Err(ConfigError::Validation(_))
		));
		assert!(matches!(
			LoginGuard::new(policy),
			Err(ConfigError::Validation(_))
		));

		let policy = PolicyConfig {
			status_code: 200,
			..PolicyConfig::default()
		};
		assert!(LoginGuard::new(policy).is_err());
	}

	#[test]
	fn reserved_login_is_forbidden_with_empty_redirect() {
		let user = UserAccount::new("b", "b@uam.es");
		let err = login().check(Some(&user)).unwrap_err();

		let payload = err.payload();
		assert_eq!(payload.error_code, "uamx__uam-domain-login-forbidden");
		assert_eq!(payload.redirect_to.as_deref(), Some(""));
		assert_eq!(payload.message, "You can't login. UAM users should use ID-UAM.");
	}

	#[test]
	fn anonymous_login_is_explicitly_empty() {
		assert_eq!(login().check(None).unwrap(), PolicyDecision::Empty);
	}

	#[test]
	fn other_logins_are_explicitly_empty() {
		let user = UserAccount::new("c", "c@example.com");
		assert_eq!(login().check(Some(&user)).unwrap(), PolicyDecision::Empty);
	}

	#[test]
	fn custom_policy_is_honored() {
		let policy = PolicyConfig {
			reserved_suffix: "example.edu".to_string(),
			login_error_code: "custom-login".to_string(),
			login_redirect_to: "https://idp.example.edu".to_string(),
			..PolicyConfig::default()
		};
		let guard = LoginGuard::new(policy).unwrap();

		let uam = UserAccount::new("b", "b@uam.es");
		assert!(guard.check(Some(&uam)).is_ok());

		let edu = UserAccount::new("e", "e@example.edu");
		let payload = guard.check(Some(&edu)).unwrap_err().payload();
		assert_eq!(payload.error_code, "custom-login");
		assert_eq!(payload.redirect_to.as_deref(), Some("https://idp.example.edu"));
	}

	proptest! {
		#[test]
		fn any_reserved_email_is_blocked_everywhere(local in "[a-z0-9._]{1,16}", sub in "([a-z]{1,6}\\.)?") {
			let email = format!("{local}@{sub}uam.es");

			let reg = registration()
				.check(&RegistrationForm::new(email.clone()))
				.unwrap_err();
			prop_assert_eq!(reg.error_code(), "uamx__uam-domain-register-forbidden");

			let user = UserAccount::new("u", email);
			let log = login().check(Some(&user)).unwrap_err();
			prop_assert_eq!(log.error_code(), "uamx__uam-domain-login-forbidden");
		}

		#[test]
		fn non_reserved_email_is_never_blocked(local in "[a-z0-9._]{1,16}", domain in "[a-z]{1,10}\\.(com|org|net)") {
			let email = format!("{local}@{domain}");

			prop_assert!(registration().check(&RegistrationForm::new(email.clone())).is_ok());

			let user = UserAccount::new("u", email);
			prop_assert_eq!(login().check(Some(&user)).unwrap(), PolicyDecision::Empty);
		}
	}
}
