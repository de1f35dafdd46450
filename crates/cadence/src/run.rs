// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One invocation driven from the command line.

use std::sync::Arc;
use std::time::Duration;

use cadence_config::CadenceConfig;
use cadence_jobs::{
	InvocationReport, IterationConfig, Job, JobExecutor, JobKey, Result, TerminalStatus,
};
use cadence_logs::{EventLog, InvocationEvent};
use serde::Serialize;
use tracing::{info, warn};

/// Command-line values that take precedence over loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
	pub group: Option<String>,
	pub name: Option<String>,
	pub iterations: Option<u32>,
	pub step_delay_ms: Option<u64>,
}

/// What to dispatch: the job identity and the loop shape.
#[derive(Debug, Clone)]
pub struct RunRequest {
	pub job_key: JobKey,
	pub config: IterationConfig,
}

impl RunRequest {
	/// Resolve overrides against `config` and validate the loop shape.
	pub fn resolve(config: &CadenceConfig, overrides: RunOverrides) -> Result<Self> {
		let group = overrides.group.unwrap_or_else(|| config.job.group.clone());
		let name = overrides.name.unwrap_or_else(|| config.job.name.clone());
		let iteration_count = overrides
			.iterations
			.unwrap_or(config.execution.iteration_count);
		let step_delay = overrides
			.step_delay_ms
			.map(Duration::from_millis)
			.unwrap_or_else(|| config.execution.step_delay());

		Ok(Self {
			job_key: JobKey::with_group(group, name),
			config: IterationConfig::new(iteration_count, step_delay)?,
		})
	}
}

/// Run `job` on its own task until it ends, cancelling it on Ctrl-C or once
/// `cancel_after` has elapsed.
pub async fn run_job(
	executor: &JobExecutor,
	job: Arc<dyn Job>,
	request: RunRequest,
	cancel_after: Option<Duration>,
) -> Result<InvocationReport> {
	let running = executor.spawn(job, request.job_key, request.config)?;
	let handle = running.handle().clone();

	let wait = running.wait();
	tokio::pin!(wait);

	tokio::select! {
		report = &mut wait => return report,
		_ = cancel_signal(cancel_after) => {
			handle.cancel();
		}
	}

	wait.await
}

async fn cancel_signal(cancel_after: Option<Duration>) {
	let deadline = async {
		match cancel_after {
			Some(after) => tokio::time::sleep(after).await,
			None => std::future::pending().await,
		}
	};
	tokio::pin!(deadline);

	tokio::select! {
		_ = &mut deadline => {
			info!(
				cancel_after_ms = cancel_after.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
				"Cancel deadline reached"
			);
		}
		result = tokio::signal::ctrl_c() => match result {
			Ok(()) => info!("Received interrupt signal, cancelling job"),
			Err(e) => {
				warn!(error = %e, "Failed to listen for interrupt signal");
				deadline.await;
			}
		},
	}
}

/// The report together with the boundary and progress events captured for it.
#[derive(Debug, Serialize)]
pub struct RunOutput {
	pub report: InvocationReport,
	pub events: Vec<InvocationEvent>,
}

impl RunOutput {
	pub fn collect(report: InvocationReport, log: &EventLog) -> Self {
		let events = log.for_invocation(&report.invocation_id.to_string());
		Self { report, events }
	}
}

/// Process exit code for a terminal status.
pub fn exit_code(status: TerminalStatus) -> i32 {
	match status {
		TerminalStatus::Completed => 0,
		TerminalStatus::Interrupted => 2,
		TerminalStatus::Failed => 1,
	}
}
