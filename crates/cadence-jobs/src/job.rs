// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::StepContext;
use crate::error::JobError;
use async_trait::async_trait;

/// A unit of work the executor runs once per iteration.
///
/// Returning [`JobError::Cancelled`] from a step ends the invocation as
/// interrupted; any other error ends it as failed.
#[async_trait]
pub trait Job: Send + Sync {
	fn id(&self) -> &str;
	fn name(&self) -> &str;
	fn description(&self) -> &str;
	async fn step(&self, ctx: &StepContext<'_>) -> Result<(), JobError>;
}
