// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Social-auth pipeline policy hooks for UAMx.
//!
//! Three steps plug into the host login/registration pipeline:
//!
//! - [`EmailAssociator`]: attaches an incoming social identity to the single
//!   local account sharing its email
//! - [`RegistrationGuard`]: refuses local registration for reserved-domain
//!   emails
//! - [`LoginGuard`]: refuses local login for reserved-domain users
//!
//! Every hook returns `Result<PolicyDecision, PolicyError>`. The pipeline
//! runner continues on `NoOpinion`/`Empty`, merges `Merge` into its context,
//! and aborts the request on `Err`, answering with [`PolicyError::payload`].

pub mod associate;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod guard;
pub mod store;
pub mod types;

pub use associate::EmailAssociator;
pub use config::{
	load_config, load_config_from, AuthConfig, ConfigError, ConfigSource, DefaultsSource,
	EnvSource, LoggingConfig, PolicyConfig, Precedence, TomlSource,
};
pub use context::{AuthAttempt, RegistrationForm, UserDetails};
pub use decision::{PartialResult, PolicyDecision};
pub use error::{ErrorPayload, PolicyError, StoreError};
pub use guard::{LoginGuard, RegistrationGuard};
pub use store::{InMemoryUserStore, UserStore};
pub use types::{UserAccount, UserId};
