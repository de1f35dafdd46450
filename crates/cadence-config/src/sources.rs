// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::CadenceConfigLayer;
use crate::sections::{ExecutionConfigLayer, JobConfigLayer, LoggingConfigLayer};

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
	fn load(&self) -> Result<CadenceConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<CadenceConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(CadenceConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/cadence/cadence.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<CadenceConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(CadenceConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: CadenceConfigLayer =
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
/// Convention: CADENCE_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<CadenceConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(CadenceConfigLayer {
			execution: Some(load_execution_from_env()?),
			job: Some(load_job_from_env()),
			logging: Some(load_logging_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {kind} value '{v}'"),
			}),
		None => Ok(None),
	}
}

fn load_execution_from_env() -> Result<ExecutionConfigLayer, ConfigError> {
	Ok(ExecutionConfigLayer {
		iteration_count: env_parse("CADENCE_EXECUTION_ITERATION_COUNT", "u32")?,
		step_delay_ms: env_parse("CADENCE_EXECUTION_STEP_DELAY_MS", "u64")?,
	})
}

fn load_job_from_env() -> JobConfigLayer {
	JobConfigLayer {
		group: env_var("CADENCE_JOB_GROUP"),
		name: env_var("CADENCE_JOB_NAME"),
	}
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("CADENCE_LOGGING_LEVEL"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.execution.is_none());
		assert!(layer.job.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/cadence.toml");
		let layer = source.load().unwrap();
		assert!(layer.execution.is_none());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[execution]\niteration_count = 7").unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.execution.unwrap().iteration_count, Some(7));
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[execution\niteration_count = 7").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
		assert!(err.to_string().contains(&file.path().display().to_string()));
	}

	#[test]
	fn test_env_parse_accepts_valid_number() {
		std::env::set_var("CADENCE_SOURCES_TEST_VALID", " 42 ");
		let value: Option<u32> = env_parse("CADENCE_SOURCES_TEST_VALID", "u32").unwrap();
		assert_eq!(value, Some(42));
	}

	#[test]
	fn test_env_parse_rejects_garbage() {
		std::env::set_var("CADENCE_SOURCES_TEST_GARBAGE", "five");
		let err = env_parse::<u64>("CADENCE_SOURCES_TEST_GARBAGE", "u64").unwrap_err();
		match err {
			ConfigError::InvalidValue { key, message } => {
				assert_eq!(key, "CADENCE_SOURCES_TEST_GARBAGE");
				assert!(message.contains("five"));
			}
			other => panic!("Expected InvalidValue, got: {:?}", other),
		}
	}

	#[test]
	fn test_env_parse_treats_empty_as_unset() {
		std::env::set_var("CADENCE_SOURCES_TEST_EMPTY", "");
		let value: Option<u32> = env_parse("CADENCE_SOURCES_TEST_EMPTY", "u32").unwrap();
		assert!(value.is_none());
	}
}
