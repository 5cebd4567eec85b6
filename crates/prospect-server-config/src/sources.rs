// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	ActionsConfigLayer, DatabaseConfigLayer, EventsConfigLayer, JobsConfigLayer, LogFormat,
	LoggingConfigLayer, SchedulerConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/prospect/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PROSPECT_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_env_layer(&|name: &str| std::env::var(name).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn load_env_layer(env: Lookup<'_>) -> Result<ServerConfigLayer, ConfigError> {
	Ok(ServerConfigLayer {
		database: Some(DatabaseConfigLayer {
			url: env_var(env, "PROSPECT_SERVER_DATABASE_URL"),
		}),
		events: Some(EventsConfigLayer {
			queue_capacity: env_parse(env, "PROSPECT_SERVER_EVENTS_QUEUE_CAPACITY")?,
		}),
		scheduler: Some(SchedulerConfigLayer {
			stop_timeout_secs: env_parse(env, "PROSPECT_SERVER_SCHEDULER_STOP_TIMEOUT_SECS")?,
			period_secs: env_parse(env, "PROSPECT_SERVER_SCHEDULER_PERIOD_SECS")?,
		}),
		jobs: Some(JobsConfigLayer {
			expiration_check_enabled: env_bool(env, "PROSPECT_SERVER_JOBS_EXPIRATION_CHECK_ENABLED"),
			expiring_horizon_days: env_parse(env, "PROSPECT_SERVER_JOBS_EXPIRING_HORIZON_DAYS")?,
			reminder_check_enabled: env_bool(env, "PROSPECT_SERVER_JOBS_REMINDER_CHECK_ENABLED"),
			reminder_trigger_code: env_var(env, "PROSPECT_SERVER_JOBS_REMINDER_TRIGGER_CODE"),
		}),
		actions: Some(ActionsConfigLayer {
			listener_timeout_secs: env_parse(env, "PROSPECT_SERVER_ACTIONS_LISTENER_TIMEOUT_SECS")?,
			webhook_timeout_secs: env_parse(env, "PROSPECT_SERVER_ACTIONS_WEBHOOK_TIMEOUT_SECS")?,
		}),
		logging: Some(LoggingConfigLayer {
			level: env_var(env, "PROSPECT_SERVER_LOG_LEVEL"),
			format: env_var(env, "PROSPECT_SERVER_LOG_FORMAT")
				.map(|v| {
					LogFormat::from_str(&v).map_err(|message| ConfigError::InvalidValue {
						key: "PROSPECT_SERVER_LOG_FORMAT".to_string(),
						message,
					})
				})
				.transpose()?,
		}),
	})
}

fn env_var(env: Lookup<'_>, name: &str) -> Option<String> {
	env(name).filter(|s| !s.is_empty())
}

fn env_bool(env: Lookup<'_>, name: &str) -> Option<bool> {
	env_var(env, name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: FromStr>(env: Lookup<'_>, name: &str) -> Result<Option<T>, ConfigError> {
	match env_var(env, name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!(
				"invalid {} value '{v}'",
				std::any::type_name::<T>()
			),
		}),
		None => Ok(None),
	}
}
