// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifiers carried by an invocation.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Group used when the scheduler does not name one.
pub const DEFAULT_GROUP: &str = "DEFAULT";

/// Scheduler-supplied job identity, rendered as `group.name`.
///
/// Opaque to the executor: it is only used for logging and correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
	group: String,
	name: String,
}

impl JobKey {
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_group(DEFAULT_GROUP, name)
	}

	pub fn with_group(group: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			group: group.into(),
			name: name.into(),
		}
	}

	pub fn group(&self) -> &str {
		&self.group
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl fmt::Display for JobKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.group, self.name)
	}
}

impl From<&str> for JobKey {
	fn from(name: &str) -> Self {
		JobKey::new(name)
	}
}

impl From<String> for JobKey {
	fn from(name: String) -> Self {
		JobKey::new(name)
	}
}

/// Unique identity of one dispatched run. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn as_uuid(&self) -> &Uuid {
		&self.0
	}
}

impl Default for InvocationId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for InvocationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Identity of the worker running an invocation's loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for WorkerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_job_key_defaults_group() {
		let key = JobKey::new("cron-job");
		assert_eq!(key.group(), DEFAULT_GROUP);
		assert_eq!(key.name(), "cron-job");
		assert_eq!(key.to_string(), "DEFAULT.cron-job");
	}

	#[test]
	fn test_job_key_with_group() {
		let key = JobKey::with_group("reports", "nightly");
		assert_eq!(key.to_string(), "reports.nightly");
		assert_ne!(key, JobKey::new("nightly"));
	}

	#[test]
	fn test_job_key_is_not_interpreted() {
		let key = JobKey::from("");
		assert_eq!(key.to_string(), "DEFAULT.");

		let key = JobKey::from("a.b.c".to_string());
		assert_eq!(key.group(), DEFAULT_GROUP);
		assert_eq!(key.name(), "a.b.c");
	}

	#[test]
	fn test_invocation_ids_are_unique() {
		let a = InvocationId::new();
		let b = InvocationId::new();
		assert_ne!(a, b);
	}

	#[test]
	fn test_worker_id_serializes_as_string() {
		let worker = WorkerId::new("cadence-7");
		let json = serde_json::to_string(&worker).unwrap();
		assert_eq!(json, "\"cadence-7\"");
	}
}
