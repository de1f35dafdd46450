// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Iteration loop configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATION_COUNT: u32 = 10;
pub const DEFAULT_STEP_DELAY_MS: u64 = 5_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfigLayer {
	pub iteration_count: Option<u32>,
	pub step_delay_ms: Option<u64>,
}

impl ExecutionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.iteration_count.is_some() {
			self.iteration_count = other.iteration_count;
		}
		if other.step_delay_ms.is_some() {
			self.step_delay_ms = other.step_delay_ms;
		}
	}

	pub fn finalize(self) -> ExecutionConfig {
		ExecutionConfig {
			iteration_count: self.iteration_count.unwrap_or(DEFAULT_ITERATION_COUNT),
			step_delay_ms: self.step_delay_ms.unwrap_or(DEFAULT_STEP_DELAY_MS),
		}
	}
}

/// Loop shape handed to the executor.
///
/// Values are passed through as configured; the executor rejects a zero
/// `iteration_count` when the invocation is dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
	pub iteration_count: u32,
	pub step_delay_ms: u64,
}

impl ExecutionConfig {
	pub fn step_delay(&self) -> Duration {
		Duration::from_millis(self.step_delay_ms)
	}
}

impl Default for ExecutionConfig {
	fn default() -> Self {
		Self {
			iteration_count: DEFAULT_ITERATION_COUNT,
			step_delay_ms: DEFAULT_STEP_DELAY_MS,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = ExecutionConfig::default();
		assert_eq!(config.iteration_count, 10);
		assert_eq!(config.step_delay(), Duration::from_secs(5));
	}

	#[test]
	fn test_layer_finalize_defaults() {
		let config = ExecutionConfigLayer::default().finalize();
		assert_eq!(config, ExecutionConfig::default());
	}

	#[test]
	fn test_layer_finalize_keeps_zero_values() {
		let layer = ExecutionConfigLayer {
			iteration_count: Some(0),
			step_delay_ms: Some(0),
		};
		let config = layer.finalize();
		assert_eq!(config.iteration_count, 0);
		assert_eq!(config.step_delay(), Duration::ZERO);
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = ExecutionConfigLayer {
			iteration_count: Some(10),
			step_delay_ms: Some(5_000),
		};
		let overlay = ExecutionConfigLayer {
			iteration_count: None,
			step_delay_ms: Some(250),
		};
		base.merge(overlay);
		assert_eq!(base.iteration_count, Some(10));
		assert_eq!(base.step_delay_ms, Some(250));
	}

	#[test]
	fn test_deserialize_layer_partial() {
		let layer: ExecutionConfigLayer = toml::from_str("iteration_count = 3").unwrap();
		assert_eq!(layer.iteration_count, Some(3));
		assert!(layer.step_delay_ms.is_none());
	}

	#[test]
	fn test_deserialize_rejects_negative_count() {
		let result: Result<ExecutionConfigLayer, _> = toml::from_str("iteration_count = -1");
		assert!(result.is_err());
	}
}
