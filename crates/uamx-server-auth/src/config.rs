// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the policy hooks.
//!
//! Values are resolved from three sources, in increasing precedence:
//!
//! 1. Built-in defaults (the deployed UAM policy)
//! 2. A TOML file (`[policy]` and `[logging]` tables)
//! 3. Environment variables (`UAMX_AUTH_*`)
//!
//! Each source produces a partial [`AuthConfigLayer`]; layers are merged and
//! then finalized into a fully resolved, validated [`AuthConfig`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, trace};

/// Institutional suffix routed to ID-UAM instead of local login.
pub const DEFAULT_RESERVED_SUFFIX: &str = "uam.es";
pub const DEFAULT_REGISTRATION_ERROR_CODE: &str = "uamx__uam-domain-register-forbidden";
pub const DEFAULT_LOGIN_ERROR_CODE: &str = "uamx__uam-domain-login-forbidden";
pub const DEFAULT_STATUS_CODE: u16 = 403;
pub const DEFAULT_REGISTRATION_MESSAGE: &str = "You can't register. UAM users should use ID-UAM.";
pub const DEFAULT_LOGIN_MESSAGE: &str = "You can't login. UAM users should use ID-UAM.";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for {key}: '{value}'")]
	InvalidValue { key: String, value: String },

	#[error("Validation failed: {0}")]
	Validation(String),
}

// =============================================================================
// Resolved configuration
// =============================================================================

/// Policy applied by the hooks (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
	pub reserved_suffix: String,
	pub registration_error_code: String,
	pub login_error_code: String,
	pub status_code: u16,
	pub registration_message: String,
	pub login_message: String,
	pub login_redirect_to: String,
	/// Refuse to auto-associate staff and superuser accounts. Off by default.
	pub deny_privileged_association: bool,
}

impl Default for PolicyConfig {
	fn default() -> Self {
		PolicyConfigLayer::default().finalize()
	}
}

impl PolicyConfig {
	/// Returns true if `email` ends with the reserved suffix.
	///
	/// Plain case-sensitive suffix match, not a domain comparison.
	pub fn is_reserved_email(&self, email: &str) -> bool {
		email.ends_with(&self.reserved_suffix)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.reserved_suffix.is_empty() {
			return Err(ConfigError::Validation(
				"reserved_suffix must not be empty".to_string(),
			));
		}
		if self.registration_error_code.is_empty() || self.login_error_code.is_empty() {
			return Err(ConfigError::Validation(
				"error codes must not be empty".to_string(),
			));
		}
		if !(400..500).contains(&self.status_code) {
			return Err(ConfigError::Validation(format!(
				"status_code must be a 4xx code, got {}",
				self.status_code
			)));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: DEFAULT_LOG_LEVEL.to_string(),
		}
	}
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
	pub policy: PolicyConfig,
	pub logging: LoggingConfig,
}

// =============================================================================
// Layers
// =============================================================================

/// Policy configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfigLayer {
	#[serde(default)]
	pub reserved_suffix: Option<String>,
	#[serde(default)]
	pub registration_error_code: Option<String>,
	#[serde(default)]
	pub login_error_code: Option<String>,
	#[serde(default)]
	pub status_code: Option<u16>,
	#[serde(default)]
	pub registration_message: Option<String>,
	#[serde(default)]
	pub login_message: Option<String>,
	#[serde(default)]
	pub login_redirect_to: Option<String>,
	#[serde(default)]
	pub deny_privileged_association: Option<bool>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: PolicyConfigLayer) {
		if other.reserved_suffix.is_some() {
			self.reserved_suffix = other.reserved_suffix;
		}
		if other.registration_error_code.is_some() {
			self.registration_error_code = other.registration_error_code;
		}
		if other.login_error_code.is_some() {
			self.login_error_code = other.login_error_code;
		}
		if other.status_code.is_some() {
			self.status_code = other.status_code;
		}
		if other.registration_message.is_some() {
			self.registration_message = other.registration_message;
		}
		if other.login_message.is_some() {
			self.login_message = other.login_message;
		}
		if other.login_redirect_to.is_some() {
			self.login_redirect_to = other.login_redirect_to;
		}
		if other.deny_privileged_association.is_some() {
			self.deny_privileged_association = other.deny_privileged_association;
		}
	}

	pub fn finalize(self) -> PolicyConfig {
		PolicyConfig {
			reserved_suffix: self
				.reserved_suffix
				.unwrap_or_else(|| DEFAULT_RESERVED_SUFFIX.to_string()),
			registration_error_code: self
				.registration_error_code
				.unwrap_or_else(|| DEFAULT_REGISTRATION_ERROR_CODE.to_string()),
			login_error_code: self
				.login_error_code
				.unwrap_or_else(|| DEFAULT_LOGIN_ERROR_CODE.to_string()),
			status_code: self.status_code.unwrap_or(DEFAULT_STATUS_CODE),
			registration_message: self
				.registration_message
				.unwrap_or_else(|| DEFAULT_REGISTRATION_MESSAGE.to_string()),
			login_message: self
				.login_message
				.unwrap_or_else(|| DEFAULT_LOGIN_MESSAGE.to_string()),
			login_redirect_to: self.login_redirect_to.unwrap_or_default(),
			deny_privileged_association: self.deny_privileged_association.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfigLayer {
	#[serde(default)]
	pub level: Option<String>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: LoggingConfigLayer) {
		if other.level.is_some() {
			self.level = other.level;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
		}
	}
}

/// Top-level configuration layer, as read from a single source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub policy: Option<PolicyConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		merge_section(&mut self.policy, other.policy, PolicyConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}

	pub fn finalize(self) -> Result<AuthConfig, ConfigError> {
		let config = AuthConfig {
			policy: self.policy.unwrap_or_default().finalize(),
			logging: self.logging.unwrap_or_default().finalize(),
		};
		config.policy.validate()?;
		Ok(config)
	}
}

fn merge_section<T>(target: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (target.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *target = Some(incoming),
		(_, None) => {}
	}
}

// =============================================================================
// Sources
// =============================================================================

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AuthConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AuthConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AuthConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is skipped.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/uamx/auth.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AuthConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AuthConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AuthConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable source.
///
/// Convention: UAMX_AUTH_<FIELD>
pub struct EnvSource {
	lookup: EnvLookup,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn new() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Read through a custom lookup instead of the process environment.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
		Self {
			lookup: Box::new(lookup),
		}
	}

	fn var(&self, key: &str) -> Option<String> {
		(self.lookup)(key).filter(|v| !v.is_empty())
	}

	fn parse_status(&self, key: &str) -> Result<Option<u16>, ConfigError> {
		self
			.var(key)
			.map(|v| {
				v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
					key: key.to_string(),
					value: v.clone(),
				})
			})
			.transpose()
	}

	fn parse_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
		self
			.var(key)
			.map(|v| match v.trim().to_lowercase().as_str() {
				"true" | "1" | "yes" | "on" => Ok(true),
				"false" | "0" | "no" | "off" => Ok(false),
				_ => Err(ConfigError::InvalidValue {
					key: key.to_string(),
					value: v.clone(),
				}),
			})
			.transpose()
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AuthConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(AuthConfigLayer {
			policy: Some(PolicyConfigLayer {
				reserved_suffix: self.var("UAMX_AUTH_RESERVED_SUFFIX"),
				registration_error_code: self.var("UAMX_AUTH_REGISTRATION_ERROR_CODE"),
				login_error_code: self.var("UAMX_AUTH_LOGIN_ERROR_CODE"),
				status_code: self.parse_status("UAMX_AUTH_STATUS_CODE")?,
				registration_message: self.var("UAMX_AUTH_REGISTRATION_MESSAGE"),
				login_message: self.var("UAMX_AUTH_LOGIN_MESSAGE"),
				// An empty redirect is meaningful, so it bypasses the empty filter.
				login_redirect_to: (self.lookup)("UAMX_AUTH_LOGIN_REDIRECT_TO"),
				deny_privileged_association: self
					.parse_bool("UAMX_AUTH_DENY_PRIVILEGED_ASSOCIATION")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: self.var("UAMX_AUTH_LOG_LEVEL"),
			}),
		})
	}
}

/// Merge the given sources in precedence order and finalize.
pub fn load_config_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<AuthConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut layer = AuthConfigLayer::default();
	for source in &sources {
		trace!(source = source.name(), "applying config source");
		layer.merge(source.load()?);
	}

	let config = layer.finalize()?;
	info!(
		reserved_suffix = %config.policy.reserved_suffix,
		deny_privileged_association = config.policy.deny_privileged_association,
		"auth policy configuration loaded"
	);
	Ok(config)
}

/// Load configuration from defaults, an optional TOML file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<AuthConfig, ConfigError> {
	let file = match path {
		Some(p) => TomlSource::new(p),
		None => TomlSource::system(),
	};
	load_config_from(vec![
		Box::new(DefaultsSource),
		Box::new(file),
		Box::new(EnvSource::new()),
	])
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	fn env(pairs: &[(&str, &str)]) -> EnvSource {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		EnvSource::from_lookup(move |key| map.get(key).cloned())
	}

	fn toml_file(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[test]
	fn defaults_match_deployed_policy() {
		let config = AuthConfigLayer::default().finalize().unwrap();
		assert_eq!(config.policy.reserved_suffix, "uam.es");
		assert_eq!(
			config.policy.registration_error_code,
			"uamx__uam-domain-register-forbidden"
		);
		assert_eq!(
			config.policy.login_error_code,
			"uamx__uam-domain-login-forbidden"
		);
		assert_eq!(config.policy.status_code, 403);
		assert_eq!(config.policy.login_redirect_to, "");
		assert!(!config.policy.deny_privileged_association);
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn suffix_match_is_case_sensitive() {
		let policy = PolicyConfig::default();
		assert!(policy.is_reserved_email("a@uam.es"));
		assert!(policy.is_reserved_email("a@estudiante.uam.es"));
		assert!(!policy.is_reserved_email("a@UAM.ES"));
		assert!(!policy.is_reserved_email("a@uam.es.example.com"));
	}

	#[test]
	fn toml_overrides_defaults() {
		let file = toml_file(
			r#"
			[policy]
			reserved_suffix = "example.edu"
			deny_privileged_association = true

			[logging]
			level = "debug"
			"#,
		);

		let config = load_config_from(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(config.policy.reserved_suffix, "example.edu");
		assert!(config.policy.deny_privileged_association);
		assert_eq!(config.policy.status_code, 403);
		assert_eq!(config.logging.level, "debug");
	}

	#[test]
	fn environment_overrides_toml_regardless_of_order() {
		let file = toml_file("[policy]\nreserved_suffix = \"from-file.es\"\n");

		let config = load_config_from(vec![
			Box::new(env(&[("UAMX_AUTH_RESERVED_SUFFIX", "from-env.es")])),
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.policy.reserved_suffix, "from-env.es");
	}

	#[test]
	fn missing_file_is_skipped() {
		let config = load_config_from(vec![Box::new(TomlSource::new(
			"/nonexistent/uamx/auth.toml",
		))])
		.unwrap();
		assert_eq!(config, AuthConfig::default());
	}

	#[test]
	fn malformed_toml_is_reported() {
		let file = toml_file("[policy\nreserved_suffix = ");
		let err = load_config_from(vec![Box::new(TomlSource::new(file.path()))]).unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn invalid_env_values_are_rejected() {
		let err = env(&[("UAMX_AUTH_STATUS_CODE", "forbidden")])
			.load()
			.unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "UAMX_AUTH_STATUS_CODE"));

		let err = env(&[("UAMX_AUTH_DENY_PRIVILEGED_ASSOCIATION", "maybe")])
			.load()
			.unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn non_client_error_status_fails_validation() {
		let err = load_config_from(vec![Box::new(env(&[("UAMX_AUTH_STATUS_CODE", "500")]))])
			.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn empty_suffix_fails_validation() {
		let layer = AuthConfigLayer {
			policy: Some(PolicyConfigLayer {
				reserved_suffix: Some(String::new()),
				..Default::default()
			}),
			logging: None,
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn env_bool_and_redirect_are_parsed() {
		let config = load_config_from(vec![Box::new(env(&[
			("UAMX_AUTH_DENY_PRIVILEGED_ASSOCIATION", "yes"),
			("UAMX_AUTH_LOGIN_REDIRECT_TO", "https://id.uam.es/login"),
		]))])
		.unwrap();
		assert!(config.policy.deny_privileged_association);
		assert_eq!(config.policy.login_redirect_to, "https://id.uam.es/login");
	}
}
