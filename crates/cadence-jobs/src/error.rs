// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::InvocationStatus;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("Invalid job configuration: {0}")]
	Configuration(String),

	#[error("Job failed: {message}")]
	Failed { message: String, retryable: bool },

	#[error("Job cancelled")]
	Cancelled,

	#[error("Invocation not found: {0}")]
	NotFound(String),

	#[error("Job executor is shutting down")]
	ShuttingDown,

	#[error("Invalid status transition from {from} to {to}")]
	InvalidTransition {
		from: InvocationStatus,
		to: InvocationStatus,
	},

	#[error("Invocation task failed: {0}")]
	Join(#[from] tokio::task::JoinError),
}

impl JobError {
	pub fn failed(message: impl Into<String>) -> Self {
		JobError::Failed {
			message: message.into(),
			retryable: false,
		}
	}

	pub fn retryable(message: impl Into<String>) -> Self {
		JobError::Failed {
			message: message.into(),
			retryable: true,
		}
	}

	/// Hint for the scheduler; the executor itself never retries.
	pub fn is_retryable(&self) -> bool {
		matches!(self, JobError::Failed { retryable: true, .. })
	}
}

pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_retryable_hint() {
		assert!(JobError::retryable("upstream timeout").is_retryable());
		assert!(!JobError::failed("bad input").is_retryable());
		assert!(!JobError::Cancelled.is_retryable());
	}

	#[test]
	fn test_display() {
		let err = JobError::Configuration("iteration_count must be at least 1".to_string());
		assert_eq!(
			err.to_string(),
			"Invalid job configuration: iteration_count must be at least 1"
		);

		let err = JobError::InvalidTransition {
			from: InvocationStatus::Completed,
			to: InvocationStatus::Running,
		};
		assert_eq!(
			err.to_string(),
			"Invalid status transition from completed to running"
		);
	}
}
