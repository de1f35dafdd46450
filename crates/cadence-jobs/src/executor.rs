// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::ExecutionHandle;
use crate::error::{JobError, Result};
use crate::iteration::{IterationLoop, LoopOutcome};
use crate::job::Job;
use crate::key::{InvocationId, JobKey, WorkerId};
use crate::types::{InvocationReport, InvocationStatus, IterationConfig, JobInvocation, TerminalStatus};
use cadence_logs::{EventKind, INVOCATION_TARGET};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

type Registry = Arc<Mutex<HashMap<InvocationId, ExecutionHandle>>>;

/// Runs job invocations and tracks the handles of those still in flight.
///
/// Every invocation gets its own [`ExecutionHandle`] and worker identity;
/// nothing is shared between invocations, even under the same [`JobKey`].
pub struct JobExecutor {
	name: String,
	next_worker: AtomicU64,
	in_flight: Registry,
	wake_tx: broadcast::Sender<()>,
	shutting_down: AtomicBool,
}

impl JobExecutor {
	pub fn new(name: impl Into<String>) -> Self {
		let (wake_tx, _) = broadcast::channel(1);
		Self {
			name: name.into(),
			next_worker: AtomicU64::new(1),
			in_flight: Arc::new(Mutex::new(HashMap::new())),
			wake_tx,
			shutting_down: AtomicBool::new(false),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Validate `config` and allocate a fresh handle for one invocation.
	///
	/// Nothing runs until [`Invocation::run`] is awaited, but the handle is
	/// already registered and can be cancelled.
	#[instrument(skip(self, job_key, config), fields(job_key = %job_key))]
	pub fn prepare(&self, job_key: JobKey, config: IterationConfig) -> Result<Invocation> {
		// Subscribe before reading the flag: a shutdown that lands after the
		// check still finds this receiver.
		let wake = self.wake_tx.subscribe();
		if self.is_shutting_down() {
			return Err(JobError::ShuttingDown);
		}

		if let Err(e) = config.validate() {
			warn!(job_key = %job_key, error = %e, "Rejected job invocation");
			return Err(e);
		}

		let id = InvocationId::new();
		let worker = self.next_worker.fetch_add(1, Ordering::Relaxed);
		let worker_id = WorkerId::new(format!("{}-{}", self.name, worker));
		let handle = ExecutionHandle::new(id, job_key.clone(), worker_id);

		self.in_flight.lock().insert(id, handle.clone());

		Ok(Invocation {
			invocation: JobInvocation::new(id, job_key, config),
			lease: HandleLease {
				handle,
				registry: Arc::clone(&self.in_flight),
			},
			wake,
		})
	}

	/// Run one invocation to its terminal state on the current task.
	///
	/// Only configuration problems (and shutdown) are returned as errors;
	/// every run that starts produces a report.
	pub async fn execute(
		&self,
		job: &dyn Job,
		job_key: JobKey,
		config: IterationConfig,
	) -> Result<InvocationReport> {
		let invocation = self.prepare(job_key, config)?;
		Ok(invocation.run(job).await)
	}

	/// Run one invocation on its own tokio task.
	pub fn spawn(
		&self,
		job: Arc<dyn Job>,
		job_key: JobKey,
		config: IterationConfig,
	) -> Result<RunningInvocation> {
		let invocation = self.prepare(job_key, config)?;
		let handle = invocation.handle();
		let task = tokio::spawn(async move { invocation.run(job.as_ref()).await });
		Ok(RunningInvocation { handle, task })
	}

	#[instrument(skip(self))]
	pub fn cancel(&self, invocation_id: &InvocationId) -> Result<bool> {
		let handle = self
			.in_flight
			.lock()
			.get(invocation_id)
			.cloned()
			.ok_or_else(|| JobError::NotFound(invocation_id.to_string()))?;

		Ok(handle.cancel())
	}

	/// Cancel every live invocation for `job_key`, returning how many were signalled.
	#[instrument(skip_all, fields(job_key = %job_key))]
	pub fn cancel_key(&self, job_key: &JobKey) -> usize {
		let handles: Vec<ExecutionHandle> = self
			.in_flight
			.lock()
			.values()
			.filter(|h| h.job_key() == job_key)
			.cloned()
			.collect();

		for handle in &handles {
			handle.cancel();
		}
		handles.len()
	}

	pub fn handle(&self, invocation_id: &InvocationId) -> Option<ExecutionHandle> {
		self.in_flight.lock().get(invocation_id).cloned()
	}

	pub fn in_flight(&self) -> Vec<ExecutionHandle> {
		self.in_flight.lock().values().cloned().collect()
	}

	/// Stop accepting invocations and wake every in-flight delay.
	///
	/// Woken loops stop as interrupted. A loop busy in a step sees the wake
	/// at its next delay.
	#[instrument(skip(self))]
	pub fn shutdown(&self) -> usize {
		self.shutting_down.store(true, Ordering::SeqCst);
		let in_flight = self.in_flight.lock().len();
		let _ = self.wake_tx.send(());
		info!(executor = %self.name, in_flight, "Job executor shutting down");
		in_flight
	}

	pub fn is_shutting_down(&self) -> bool {
		self.shutting_down.load(Ordering::SeqCst)
	}
}

impl Default for JobExecutor {
	fn default() -> Self {
		Self::new("cadence")
	}
}

/// A validated invocation that has not started yet.
pub struct Invocation {
	invocation: JobInvocation,
	lease: HandleLease,
	wake: broadcast::Receiver<()>,
}

impl Invocation {
	pub fn id(&self) -> InvocationId {
		self.invocation.id
	}

	pub fn job_key(&self) -> &JobKey {
		&self.invocation.job_key
	}

	pub fn status(&self) -> InvocationStatus {
		self.invocation.status()
	}

	pub fn handle(&self) -> ExecutionHandle {
		self.lease.handle.clone()
	}

	/// Run the iteration loop, bracketed by start and end boundary events.
	///
	/// The end event and handle release also happen if this future is dropped
	/// before completion.
	#[instrument(skip_all, fields(invocation_id = %self.invocation.id, job_id = job.id()))]
	pub async fn run(self, job: &dyn Job) -> InvocationReport {
		let Invocation {
			mut invocation,
			lease,
			wake,
		} = self;
		let handle = lease.handle.clone();
		let clock = tokio::time::Instant::now();
		let started_at = Utc::now();
		invocation.started_at = Some(started_at);

		info!(
			target: INVOCATION_TARGET,
			event = EventKind::Start.as_str(),
			job_key = %handle.job_key(),
			worker_id = %handle.worker_id(),
			invocation_id = %handle.invocation_id(),
			job_name = job.name(),
			iteration_count = invocation.config.iteration_count,
			step_delay_ms = invocation.config.step_delay_ms(),
			"Job invocation started"
		);

		let mut boundary = EndBoundary {
			handle: handle.clone(),
			outcome: None,
		};

		let outcome = IterationLoop::new(job, &handle, invocation.config)
			.with_wake(wake)
			.run(&mut invocation)
			.await;

		let status = outcome.status();
		let steps_completed = outcome.steps();
		boundary.outcome = Some((status, steps_completed));

		if let Err(e) = invocation.transition(status.into()) {
			error!(invocation_id = %invocation.id, error = %e, "Invocation state machine violated");
		}

		let (interrupted_by, error, retryable) = match outcome {
			LoopOutcome::Completed { .. } => (None, None, false),
			LoopOutcome::Interrupted { cause, .. } => (Some(cause), None, false),
			LoopOutcome::Failed { error, .. } => {
				warn!(
					job_key = %handle.job_key(),
					invocation_id = %handle.invocation_id(),
					error = %error,
					"Job invocation failed"
				);
				(None, Some(error.to_string()), error.is_retryable())
			}
		};

		let report = InvocationReport {
			invocation_id: invocation.id,
			job_key: invocation.job_key.clone(),
			worker_id: handle.worker_id().clone(),
			status,
			steps_completed,
			interrupted_by,
			started_at,
			ended_at: invocation.ended_at.unwrap_or_else(Utc::now),
			duration_ms: duration_ms(clock.elapsed()),
			error,
			retryable,
		};

		drop(boundary);
		drop(lease);
		report
	}
}

/// A running invocation on its own task.
pub struct RunningInvocation {
	handle: ExecutionHandle,
	task: JoinHandle<InvocationReport>,
}

impl RunningInvocation {
	pub fn id(&self) -> InvocationId {
		self.handle.invocation_id()
	}

	pub fn handle(&self) -> &ExecutionHandle {
		&self.handle
	}

	pub fn cancel(&self) -> bool {
		self.handle.cancel()
	}

	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}

	pub async fn wait(self) -> Result<InvocationReport> {
		Ok(self.task.await?)
	}
}

fn duration_ms(elapsed: Duration) -> i64 {
	i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}

/// Releases the handle and drops it from the registry when the invocation ends.
struct HandleLease {
	handle: ExecutionHandle,
	registry: Registry,
}

impl Drop for HandleLease {
	fn drop(&mut self) {
		self.handle.release();
		self.registry.lock().remove(&self.handle.invocation_id());
	}
}

/// Emits the end boundary event exactly once, however the run exits.
struct EndBoundary {
	handle: ExecutionHandle,
	outcome: Option<(TerminalStatus, u32)>,
}

impl Drop for EndBoundary {
	fn drop(&mut self) {
		match self.outcome {
			Some((status, steps_completed)) => info!(
				target: INVOCATION_TARGET,
				event = EventKind::End.as_str(),
				job_key = %self.handle.job_key(),
				worker_id = %self.handle.worker_id(),
				invocation_id = %self.handle.invocation_id(),
				status = %status,
				steps_completed,
				"Job invocation ended"
			),
			None => warn!(
				target: INVOCATION_TARGET,
				event = EventKind::End.as_str(),
				job_key = %self.handle.job_key(),
				worker_id = %self.handle.worker_id(),
				invocation_id = %self.handle.invocation_id(),
				status = %TerminalStatus::Interrupted,
				"Job invocation abandoned before completion"
			),
		}
	}
}
