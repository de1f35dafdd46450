// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use cadence_jobs::{Job, JobError, StepContext};
use tracing::instrument;

/// Logs a counting marker on every step.
#[derive(Default)]
pub struct CountingJob {
	counted: AtomicU64,
}

impl CountingJob {
	pub fn new() -> Self {
		Self::default()
	}

	/// Steps counted across every invocation of this job.
	pub fn counted(&self) -> u64 {
		self.counted.load(Ordering::Relaxed)
	}
}

#[async_trait]
impl Job for CountingJob {
	fn id(&self) -> &str {
		"cron-job"
	}

	fn name(&self) -> &str {
		"Counting Job"
	}

	fn description(&self) -> &str {
		"Logs a counting marker once per iteration"
	}

	#[instrument(skip(self, ctx), fields(job_id = "cron-job"))]
	async fn step(&self, ctx: &StepContext<'_>) -> Result<(), JobError> {
		if ctx.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		self.counted.fetch_add(1, Ordering::Relaxed);
		tracing::info!(
			job_key = %ctx.job_key(),
			worker_id = %ctx.worker_id(),
			count = ctx.iteration,
			"Counting"
		);

		Ok(())
	}
}
