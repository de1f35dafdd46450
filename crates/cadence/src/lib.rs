// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line host for cadence jobs.

pub mod jobs;
pub mod run;
pub mod version;
