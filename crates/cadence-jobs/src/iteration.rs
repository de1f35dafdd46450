// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The timed work loop.
//!
//! Each step is: check cancellation, do the work, wait `step_delay`, check
//! cancellation again. The wait is the only suspension point and wakes early
//! when the handle is cancelled, so cancellation latency is bounded by one
//! step's work.

use crate::context::{ExecutionHandle, StepContext};
use crate::error::JobError;
use crate::job::Job;
use crate::types::{InvocationStatus, IterationConfig, JobInvocation, TerminalStatus};
use cadence_logs::{EventKind, INVOCATION_TARGET};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::sync::broadcast::{
	self,
	error::{RecvError, TryRecvError},
};
use tracing::{debug, info, warn};

/// Why a loop stopped before running every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptCause {
	/// The handle's flag was observed at a check point.
	Cancelled,
	/// The delay was cut short by something other than the flag.
	AbruptWake,
}

#[derive(Debug)]
pub enum LoopOutcome {
	Completed { steps: u32 },
	Interrupted { steps: u32, cause: InterruptCause },
	Failed { steps: u32, error: JobError },
}

impl LoopOutcome {
	pub fn steps(&self) -> u32 {
		match self {
			LoopOutcome::Completed { steps }
			| LoopOutcome::Interrupted { steps, .. }
			| LoopOutcome::Failed { steps, .. } => *steps,
		}
	}

	pub fn status(&self) -> TerminalStatus {
		match self {
			LoopOutcome::Completed { .. } => TerminalStatus::Completed,
			LoopOutcome::Interrupted { .. } => TerminalStatus::Interrupted,
			LoopOutcome::Failed { .. } => TerminalStatus::Failed,
		}
	}
}

enum Delay {
	Elapsed,
	Cancelled,
	Woken(&'static str),
}

pub struct IterationLoop<'a> {
	job: &'a dyn Job,
	handle: &'a ExecutionHandle,
	config: IterationConfig,
	wake: Option<broadcast::Receiver<()>>,
}

impl<'a> IterationLoop<'a> {
	pub fn new(job: &'a dyn Job, handle: &'a ExecutionHandle, config: IterationConfig) -> Self {
		Self {
			job,
			handle,
			config,
			wake: None,
		}
	}

	/// Any message on `wake`, or the sender going away, aborts the current delay.
	pub fn with_wake(mut self, wake: broadcast::Receiver<()>) -> Self {
		self.wake = Some(wake);
		self
	}

	/// Run the steps, moving `invocation` to `Running` when the first one begins.
	///
	/// The terminal transition is left to the caller.
	pub async fn run(mut self, invocation: &mut JobInvocation) -> LoopOutcome {
		let iteration_count = self.config.iteration_count;
		let mut steps = 0u32;

		for iteration in 0..iteration_count {
			if self.handle.is_cancelled() {
				return self.interrupted(steps, InterruptCause::Cancelled);
			}

			if iteration == 0 {
				if let Err(error) = invocation.transition(InvocationStatus::Running) {
					return LoopOutcome::Failed { steps, error };
				}
			}

			let ctx = StepContext {
				iteration,
				iteration_count,
				handle: self.handle,
			};

			match AssertUnwindSafe(self.job.step(&ctx)).catch_unwind().await {
				Ok(Ok(())) => {}
				Ok(Err(JobError::Cancelled)) => {
					self.handle.cancel();
					return self.interrupted(steps, InterruptCause::Cancelled);
				}
				Ok(Err(error)) => return LoopOutcome::Failed { steps, error },
				Err(panic) => {
					let message = format!("step {iteration} panicked: {}", panic_message(&*panic));
					return LoopOutcome::Failed {
						steps,
						error: JobError::failed(message),
					};
				}
			}

			steps += 1;
			info!(
				target: INVOCATION_TARGET,
				event = EventKind::Progress.as_str(),
				job_key = %self.handle.job_key(),
				worker_id = %self.handle.worker_id(),
				invocation_id = %self.handle.invocation_id(),
				iteration,
				"Job progress"
			);

			match self.delay().await {
				Delay::Elapsed => {}
				Delay::Cancelled => return self.interrupted(steps, InterruptCause::Cancelled),
				Delay::Woken(reason) => {
					warn!(
						job_key = %self.handle.job_key(),
						worker_id = %self.handle.worker_id(),
						invocation_id = %self.handle.invocation_id(),
						iteration,
						reason,
						"Step delay woken abruptly, stopping invocation"
					);
					self.handle.cancel();
					return self.interrupted(steps, InterruptCause::AbruptWake);
				}
			}

			if self.handle.is_cancelled() {
				return self.interrupted(steps, InterruptCause::Cancelled);
			}
		}

		LoopOutcome::Completed { steps }
	}

	async fn delay(&mut self) -> Delay {
		let handle = self.handle;

		if self.config.step_delay.is_zero() {
			tokio::task::yield_now().await;
			if handle.is_cancelled() {
				return Delay::Cancelled;
			}
			return match pending_wake(&mut self.wake) {
				Some(reason) => Delay::Woken(reason),
				None => Delay::Elapsed,
			};
		}

		let wake = &mut self.wake;
		tokio::select! {
			biased;
			_ = handle.cancelled() => Delay::Cancelled,
			reason = woken(wake) => Delay::Woken(reason),
			_ = tokio::time::sleep(self.config.step_delay) => Delay::Elapsed,
		}
	}

	fn interrupted(&self, steps: u32, cause: InterruptCause) -> LoopOutcome {
		debug!(
			invocation_id = %self.handle.invocation_id(),
			steps,
			?cause,
			"Iteration loop interrupted"
		);
		LoopOutcome::Interrupted { steps, cause }
	}
}

async fn woken(wake: &mut Option<broadcast::Receiver<()>>) -> &'static str {
	match wake {
		Some(rx) => match rx.recv().await {
			Ok(()) | Err(RecvError::Lagged(_)) => "shutdown",
			Err(RecvError::Closed) => "executor dropped",
		},
		None => std::future::pending().await,
	}
}

/// Non-blocking variant of [`woken`] for delays that never suspend.
fn pending_wake(wake: &mut Option<broadcast::Receiver<()>>) -> Option<&'static str> {
	match wake.as_mut()?.try_recv() {
		Ok(()) | Err(TryRecvError::Lagged(_)) => Some("shutdown"),
		Err(TryRecvError::Closed) => Some("executor dropped"),
		Err(TryRecvError::Empty) => None,
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(s) = panic.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic payload".to_string()
	}
}
