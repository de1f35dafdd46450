// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{JobError, Result};
use crate::iteration::InterruptCause;
use crate::key::{InvocationId, JobKey, WorkerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lifecycle of one invocation: `Pending -> Running -> {Completed, Interrupted, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
	Pending,
	Running,
	Completed,
	Interrupted,
	Failed,
}

impl InvocationStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			InvocationStatus::Pending => "pending",
			InvocationStatus::Running => "running",
			InvocationStatus::Completed => "completed",
			InvocationStatus::Interrupted => "interrupted",
			InvocationStatus::Failed => "failed",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			InvocationStatus::Completed | InvocationStatus::Interrupted | InvocationStatus::Failed
		)
	}

	/// Terminal states are absorbing and nothing re-enters `Running`.
	/// `Pending` may end directly when cancelled before the first step.
	pub fn can_transition_to(&self, next: InvocationStatus) -> bool {
		use InvocationStatus::*;
		matches!(
			(self, next),
			(Pending, Running)
				| (Pending, Interrupted)
				| (Pending, Failed)
				| (Running, Completed)
				| (Running, Interrupted)
				| (Running, Failed)
		)
	}
}

impl fmt::Display for InvocationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Final, absorbing outcome reported back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
	Completed,
	Interrupted,
	Failed,
}

impl TerminalStatus {
	pub fn as_str(&self) -> &'static str {
		InvocationStatus::from(*self).as_str()
	}
}

impl From<TerminalStatus> for InvocationStatus {
	fn from(status: TerminalStatus) -> Self {
		match status {
			TerminalStatus::Completed => InvocationStatus::Completed,
			TerminalStatus::Interrupted => InvocationStatus::Interrupted,
			TerminalStatus::Failed => InvocationStatus::Failed,
		}
	}
}

impl fmt::Display for TerminalStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// How many steps to run and how long to wait after each.
///
/// There are no defaults here; callers pass both values explicitly and the
/// executor validates them before anything runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationConfig {
	pub iteration_count: u32,
	pub step_delay: Duration,
}

impl IterationConfig {
	pub fn new(iteration_count: u32, step_delay: Duration) -> Result<Self> {
		let config = Self {
			iteration_count,
			step_delay,
		};
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.iteration_count == 0 {
			return Err(JobError::Configuration(
				"iteration_count must be at least 1".to_string(),
			));
		}
		Ok(())
	}

	/// The delay in whole milliseconds, saturating at `u64::MAX`.
	pub fn step_delay_ms(&self) -> u64 {
		u64::try_from(self.step_delay.as_millis()).unwrap_or(u64::MAX)
	}

	/// Upper bound on the run time when nothing cancels it.
	pub fn nominal_duration(&self) -> Duration {
		self.step_delay.saturating_mul(self.iteration_count)
	}
}

/// One dispatched run and its state machine.
#[derive(Debug, Clone)]
pub struct JobInvocation {
	pub id: InvocationId,
	pub job_key: JobKey,
	pub config: IterationConfig,
	status: InvocationStatus,
	pub started_at: Option<DateTime<Utc>>,
	pub ended_at: Option<DateTime<Utc>>,
}

impl JobInvocation {
	pub fn new(id: InvocationId, job_key: JobKey, config: IterationConfig) -> Self {
		Self {
			id,
			job_key,
			config,
			status: InvocationStatus::Pending,
			started_at: None,
			ended_at: None,
		}
	}

	pub fn status(&self) -> InvocationStatus {
		self.status
	}

	pub fn transition(&mut self, next: InvocationStatus) -> Result<()> {
		if !self.status.can_transition_to(next) {
			return Err(JobError::InvalidTransition {
				from: self.status,
				to: next,
			});
		}
		self.status = next;
		if next.is_terminal() {
			self.ended_at = Some(Utc::now());
		}
		Ok(())
	}
}

/// Everything the scheduler learns about a finished invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationReport {
	pub invocation_id: InvocationId,
	pub job_key: JobKey,
	pub worker_id: WorkerId,
	pub status: TerminalStatus,
	pub steps_completed: u32,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub interrupted_by: Option<InterruptCause>,
	pub started_at: DateTime<Utc>,
	pub ended_at: DateTime<Utc>,
	pub duration_ms: i64,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub error: Option<String>,
	pub retryable: bool,
}
