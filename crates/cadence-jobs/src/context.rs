// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::key::{InvocationId, JobKey, WorkerId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Cancellation token bound to exactly one invocation.
///
/// Clones share state, so the scheduler can keep a clone while the loop
/// polls another. The flag is set at most once and never reset; no method
/// blocks.
#[derive(Clone)]
pub struct ExecutionHandle {
	inner: Arc<HandleInner>,
}

struct HandleInner {
	invocation_id: InvocationId,
	job_key: JobKey,
	worker_id: WorkerId,
	cancelled: AtomicBool,
	released: AtomicBool,
	wake: Notify,
}

impl ExecutionHandle {
	pub(crate) fn new(invocation_id: InvocationId, job_key: JobKey, worker_id: WorkerId) -> Self {
		Self {
			inner: Arc::new(HandleInner {
				invocation_id,
				job_key,
				worker_id,
				cancelled: AtomicBool::new(false),
				released: AtomicBool::new(false),
				wake: Notify::new(),
			}),
		}
	}

	/// Request the invocation to stop.
	///
	/// Returns `true` only for the call that actually set the flag.
	pub fn cancel(&self) -> bool {
		let first = !self.inner.cancelled.swap(true, Ordering::SeqCst);
		if first {
			self.inner.wake.notify_waiters();
			debug!(
				invocation_id = %self.inner.invocation_id,
				job_key = %self.inner.job_key,
				released = self.is_released(),
				"Cancellation requested"
			);
		}
		first
	}

	pub fn is_cancelled(&self) -> bool {
		self.inner.cancelled.load(Ordering::SeqCst)
	}

	/// Whether the owning invocation has terminated.
	pub fn is_released(&self) -> bool {
		self.inner.released.load(Ordering::SeqCst)
	}

	pub fn invocation_id(&self) -> InvocationId {
		self.inner.invocation_id
	}

	pub fn job_key(&self) -> &JobKey {
		&self.inner.job_key
	}

	pub fn worker_id(&self) -> &WorkerId {
		&self.inner.worker_id
	}

	/// Resolves once [`cancel`](Self::cancel) has been called.
	pub async fn cancelled(&self) {
		loop {
			let notified = self.inner.wake.notified();
			tokio::pin!(notified);
			// Register before checking the flag so a concurrent cancel cannot slip between.
			notified.as_mut().enable();
			if self.is_cancelled() {
				return;
			}
			notified.await;
		}
	}

	pub(crate) fn release(&self) {
		self.inner.released.store(true, Ordering::SeqCst);
	}
}

impl std::fmt::Debug for ExecutionHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExecutionHandle")
			.field("invocation_id", &self.inner.invocation_id)
			.field("job_key", &self.inner.job_key)
			.field("worker_id", &self.inner.worker_id)
			.field("cancelled", &self.is_cancelled())
			.field("released", &self.is_released())
			.finish()
	}
}

/// What a [`crate::Job`] sees while performing one step.
pub struct StepContext<'a> {
	/// Zero-based index of the step being performed.
	pub iteration: u32,
	pub iteration_count: u32,
	pub handle: &'a ExecutionHandle,
}

impl StepContext<'_> {
	pub fn job_key(&self) -> &JobKey {
		self.handle.job_key()
	}

	pub fn worker_id(&self) -> &WorkerId {
		self.handle.worker_id()
	}

	pub fn is_cancelled(&self) -> bool {
		self.handle.is_cancelled()
	}

	pub fn is_last(&self) -> bool {
		self.iteration + 1 == self.iteration_count
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	fn handle() -> ExecutionHandle {
		ExecutionHandle::new(
			InvocationId::new(),
			JobKey::new("handle-test"),
			WorkerId::new("worker-1"),
		)
	}

	#[test]
	fn test_new_handle_is_not_cancelled() {
		let handle = handle();
		assert!(!handle.is_cancelled());
		assert!(!handle.is_released());
	}

	#[test]
	fn test_cancel_is_idempotent() {
		let handle = handle();
		assert!(handle.cancel());
		assert!(!handle.cancel());
		assert!(!handle.cancel());
		assert!(handle.is_cancelled());
	}

	#[test]
	fn test_clones_share_cancellation() {
		let handle = handle();
		let scheduler_view = handle.clone();
		scheduler_view.cancel();
		assert!(handle.is_cancelled());
	}

	#[test]
	fn test_cancel_from_another_thread_is_observed() {
		let handle = handle();
		let remote = handle.clone();
		std::thread::spawn(move || {
			remote.cancel();
		})
		.join()
		.unwrap();
		assert!(handle.is_cancelled());
	}

	#[test]
	fn test_concurrent_cancels_set_flag_once() {
		let handle = handle();
		let threads: Vec<_> = (0..8)
			.map(|_| {
				let h = handle.clone();
				std::thread::spawn(move || h.cancel())
			})
			.collect();

		let winners = threads
			.into_iter()
			.map(|t| t.join().unwrap())
			.filter(|first| *first)
			.count();
		assert_eq!(winners, 1);
	}

	#[test]
	fn test_release_keeps_cancellation_monotonic() {
		let handle = handle();
		handle.cancel();
		handle.release();
		assert!(handle.is_released());
		assert!(handle.is_cancelled());
		assert!(!handle.cancel());
	}

	#[tokio::test]
	async fn test_cancelled_resolves_after_cancel() {
		let handle = handle();
		let remote = handle.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(10)).await;
			remote.cancel();
		});

		tokio::time::timeout(Duration::from_secs(5), handle.cancelled())
			.await
			.expect("cancelled() should resolve");
	}

	#[tokio::test]
	async fn test_cancelled_resolves_immediately_when_already_set() {
		let handle = handle();
		handle.cancel();
		tokio::time::timeout(Duration::from_millis(100), handle.cancelled())
			.await
			.expect("cancelled() should resolve immediately");
	}

	#[test]
	fn test_step_context_accessors() {
		let handle = handle();
		let ctx = StepContext {
			iteration: 2,
			iteration_count: 3,
			handle: &handle,
		};
		assert_eq!(ctx.job_key().name(), "handle-test");
		assert_eq!(ctx.worker_id().as_str(), "worker-1");
		assert!(ctx.is_last());
		assert!(!ctx.is_cancelled());
	}
}
