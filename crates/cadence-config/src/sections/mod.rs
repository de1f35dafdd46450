// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for cadence.

pub mod execution;
pub mod job;
pub mod logging;

pub use execution::{ExecutionConfig, ExecutionConfigLayer};
pub use job::{JobConfig, JobConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
