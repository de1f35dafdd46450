// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;
use std::time::Duration;

use cadence_config::{load_config_with_file, ConfigError};

// Environment variables are process-wide, so every case that touches them
// lives in this one test.
#[test]
fn file_and_environment_layer_over_defaults() {
	let dir = tempfile::tempdir().unwrap();
	let config = load_config_with_file(dir.path().join("absent.toml")).unwrap();
	assert_eq!(config.job.group, "DEFAULT");
	assert_eq!(config.execution.iteration_count, 10);

	let mut file = tempfile::NamedTempFile::new().unwrap();
	write!(
		file,
		r#"
[execution]
iteration_count = 4
step_delay_ms = 250

[job]
group = "reports"
"#
	)
	.unwrap();

	let config = load_config_with_file(file.path()).unwrap();
	assert_eq!(config.execution.iteration_count, 4);
	assert_eq!(config.execution.step_delay(), Duration::from_millis(250));
	assert_eq!(config.job.group, "reports");
	assert_eq!(config.job.name, "cron-job");
	assert_eq!(config.logging.level, "info");

	std::env::set_var("CADENCE_EXECUTION_STEP_DELAY_MS", "0");
	std::env::set_var("CADENCE_JOB_NAME", "nightly");
	let config = load_config_with_file(file.path()).unwrap();
	assert_eq!(config.execution.iteration_count, 4);
	assert_eq!(config.execution.step_delay(), Duration::ZERO);
	assert_eq!(config.job.group, "reports");
	assert_eq!(config.job.name, "nightly");

	std::env::set_var("CADENCE_EXECUTION_ITERATION_COUNT", "ten");
	let err = load_config_with_file(file.path()).unwrap_err();
	assert!(matches!(
		err,
		ConfigError::InvalidValue { ref key, .. } if key == "CADENCE_EXECUTION_ITERATION_COUNT"
	));

	std::env::remove_var("CADENCE_EXECUTION_ITERATION_COUNT");
	std::env::remove_var("CADENCE_EXECUTION_STEP_DELAY_MS");
	std::env::remove_var("CADENCE_JOB_NAME");
}
