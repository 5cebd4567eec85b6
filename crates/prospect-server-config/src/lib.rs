// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Prospect background worker.
//!
//! This crate provides:
//! - Layered configuration from defaults, a TOML file and the environment
//! - Consistent environment variable naming (`PROSPECT_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use prospect_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("database at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub events: EventsConfig,
	pub scheduler: SchedulerConfig,
	pub jobs: JobsConfig,
	pub actions: ActionsConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from defaults, `/etc/prospect/server.toml` and the
/// environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment variables only.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration using the given TOML file in place of the system one.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		database: layer.database.unwrap_or_default().finalize(),
		events: layer.events.unwrap_or_default().finalize(),
		scheduler: layer.scheduler.unwrap_or_default().finalize(),
		jobs: layer.jobs.unwrap_or_default().finalize(),
		actions: layer.actions.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		database = %config.database.url,
		queue_capacity = config.events.queue_capacity,
		expiration_check = config.jobs.expiration_check_enabled,
		reminder_check = config.jobs.reminder_check_enabled,
		reminder_trigger_code = %config.jobs.reminder_trigger_code,
		log_format = %config.logging.format,
		"Server configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.events.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"events.queue_capacity must be greater than zero".to_string(),
		));
	}
	if config.scheduler.period_secs == 0 {
		return Err(ConfigError::Validation(
			"scheduler.period_secs must be greater than zero".to_string(),
		));
	}
	if config.actions.listener_timeout_secs == 0 {
		return Err(ConfigError::Validation(
			"actions.listener_timeout_secs must be greater than zero".to_string(),
		));
	}
	if config.jobs.reminder_trigger_code.trim().is_empty() {
		return Err(ConfigError::Validation(
			"jobs.reminder_trigger_code must not be empty".to_string(),
		));
	}
	Ok(())
}
