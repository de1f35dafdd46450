// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job identity section.

use serde::{Deserialize, Serialize};

fn default_group() -> String {
	"DEFAULT".to_string()
}

fn default_name() -> String {
	"cron-job".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobConfigLayer {
	pub group: Option<String>,
	pub name: Option<String>,
}

impl JobConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.group.is_some() {
			self.group = other.group;
		}
		if other.name.is_some() {
			self.name = other.name;
		}
	}

	pub fn finalize(self) -> JobConfig {
		JobConfig {
			group: self.group.unwrap_or_else(default_group),
			name: self.name.unwrap_or_else(default_name),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobConfig {
	pub group: String,
	pub name: String,
}

impl Default for JobConfig {
	fn default() -> Self {
		Self {
			group: default_group(),
			name: default_name(),
		}
	}
}
