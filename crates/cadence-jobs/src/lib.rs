// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cancellable long-running job execution for Cadence.
//!
//! A scheduler hands a [`Job`], a [`JobKey`] and an [`IterationConfig`] to the
//! [`JobExecutor`]. The executor allocates a fresh [`ExecutionHandle`] for the
//! invocation, runs a bounded number of timed steps, and reports a
//! [`TerminalStatus`]. The handle can be cancelled from any task at any time;
//! the loop observes the request before and after every delay.

pub mod context;
pub mod error;
pub mod executor;
pub mod iteration;
pub mod job;
pub mod key;
pub mod types;

pub use context::{ExecutionHandle, StepContext};
pub use error::{JobError, Result};
pub use executor::{Invocation, JobExecutor, RunningInvocation};
pub use iteration::{InterruptCause, IterationLoop, LoopOutcome};
pub use job::Job;
pub use key::{InvocationId, JobKey, WorkerId, DEFAULT_GROUP};
pub use types::{InvocationReport, InvocationStatus, IterationConfig, JobInvocation, TerminalStatus};
