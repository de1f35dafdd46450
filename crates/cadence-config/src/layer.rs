// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{ExecutionConfigLayer, JobConfigLayer, LoggingConfigLayer};

/// Cadence configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CadenceConfigLayer {
	#[serde(default)]
	pub execution: Option<ExecutionConfigLayer>,
	#[serde(default)]
	pub job: Option<JobConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl CadenceConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: CadenceConfigLayer) {
		merge_option(
			&mut self.execution,
			other.execution,
			ExecutionConfigLayer::merge,
		);
		merge_option(&mut self.job, other.job, JobConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_empty_layers() {
		let mut base = CadenceConfigLayer::default();
		base.merge(CadenceConfigLayer::default());
		assert!(base.execution.is_none());
		assert!(base.job.is_none());
	}

	#[test]
	fn test_merge_preserves_base_when_other_empty() {
		let mut base = CadenceConfigLayer {
			execution: Some(ExecutionConfigLayer {
				iteration_count: Some(3),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(CadenceConfigLayer::default());
		assert_eq!(base.execution.as_ref().unwrap().iteration_count, Some(3));
	}

	#[test]
	fn test_merge_fills_missing_section() {
		let mut base = CadenceConfigLayer::default();
		base.merge(CadenceConfigLayer {
			job: Some(JobConfigLayer {
				name: Some("nightly".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(base.job.unwrap().name.as_deref(), Some("nightly"));
	}

	#[test]
	fn test_merge_field_level_precedence() {
		let mut base = CadenceConfigLayer {
			execution: Some(ExecutionConfigLayer {
				iteration_count: Some(3),
				step_delay_ms: Some(1_000),
			}),
			..Default::default()
		};
		base.merge(CadenceConfigLayer {
			execution: Some(ExecutionConfigLayer {
				iteration_count: None,
				step_delay_ms: Some(50),
			}),
			..Default::default()
		});
		let execution = base.execution.unwrap();
		assert_eq!(execution.iteration_count, Some(3));
		assert_eq!(execution.step_delay_ms, Some(50));
	}

	#[test]
	fn test_deserialize_full_document() {
		let toml_str = r#"
[execution]
iteration_count = 4
step_delay_ms = 250

[job]
group = "reports"
name = "nightly"

[logging]
level = "debug"
"#;
		let layer: CadenceConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(layer.execution.unwrap().step_delay_ms, Some(250));
		assert_eq!(layer.job.unwrap().group.as_deref(), Some("reports"));
		assert_eq!(layer.logging.unwrap().level.as_deref(), Some("debug"));
	}
}
