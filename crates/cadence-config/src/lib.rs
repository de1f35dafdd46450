// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for cadence.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Consistent environment variable naming (`CADENCE_*`)
//!
//! # Usage
//!
//! ```ignore
//! use cadence_config::load_config;
//!
//! let config = load_config()?;
//! println!("{} steps every {:?}", config.execution.iteration_count, config.execution.step_delay());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::CadenceConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved cadence configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CadenceConfig {
	pub execution: ExecutionConfig,
	pub job: JobConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`CADENCE_*`)
/// 2. Config file (`/etc/cadence/cadence.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<CadenceConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<CadenceConfig, ConfigError> {
	let mut merged = CadenceConfigLayer::default();
	merged.merge(EnvSource.load()?);
	Ok(finalize(merged))
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<CadenceConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<CadenceConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = CadenceConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	Ok(finalize(merged))
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: CadenceConfigLayer) -> CadenceConfig {
	let execution = layer.execution.unwrap_or_default().finalize();
	let job = layer.job.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		iteration_count = execution.iteration_count,
		step_delay_ms = execution.step_delay_ms,
		job_group = %job.group,
		job_name = %job.name,
		log_level = %logging.level,
		"Cadence configuration loaded"
	);

	CadenceConfig {
		execution,
		job,
		logging,
	}
}
