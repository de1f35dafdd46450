// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Invocation event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log level matching tracing levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl LogLevel {
	/// Convert from tracing Level.
	pub fn from_tracing(level: &tracing::Level) -> Self {
		match *level {
			tracing::Level::TRACE => LogLevel::Trace,
			tracing::Level::DEBUG => LogLevel::Debug,
			tracing::Level::INFO => LogLevel::Info,
			tracing::Level::WARN => LogLevel::Warn,
			tracing::Level::ERROR => LogLevel::Error,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Trace => "trace",
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warn => "warn",
			LogLevel::Error => "error",
		}
	}
}

impl std::fmt::Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Kind of invocation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	Start,
	Progress,
	End,
}

impl EventKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EventKind::Start => "start",
			EventKind::Progress => "progress",
			EventKind::End => "end",
		}
	}

	pub fn parse(s: &str) -> Option<Self> {
		match s {
			"start" => Some(EventKind::Start),
			"progress" => Some(EventKind::Progress),
			"end" => Some(EventKind::End),
			_ => None,
		}
	}
}

impl std::fmt::Display for EventKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// A captured boundary or progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationEvent {
	/// Sequential ID assigned by the [`crate::EventLog`].
	pub id: u64,
	pub timestamp: DateTime<Utc>,
	pub level: LogLevel,
	pub kind: EventKind,
	pub job_key: String,
	pub worker_id: String,
	pub invocation_id: String,
	/// Zero-based iteration index, present on progress events.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub iteration: Option<u64>,
	/// Terminal status, present on end events.
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub status: Option<String>,
	pub message: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_event_kind_parse() {
		assert_eq!(EventKind::parse("start"), Some(EventKind::Start));
		assert_eq!(EventKind::parse("progress"), Some(EventKind::Progress));
		assert_eq!(EventKind::parse("end"), Some(EventKind::End));
		assert_eq!(EventKind::parse("restart"), None);
	}

	#[test]
	fn test_level_ordering() {
		assert!(LogLevel::Warn > LogLevel::Info);
		assert!(LogLevel::Trace < LogLevel::Debug);
	}

	#[test]
	fn test_event_serializes_without_empty_optionals() {
		let event = InvocationEvent {
			id: 1,
			timestamp: Utc::now(),
			level: LogLevel::Info,
			kind: EventKind::Start,
			job_key: "DEFAULT.cron-job".to_string(),
			worker_id: "cadence-1".to_string(),
			invocation_id: "inv-1".to_string(),
			iteration: None,
			status: None,
			message: "Job invocation started".to_string(),
		};

		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["kind"], "start");
		assert!(json.get("iteration").is_none());
		assert!(json.get("status").is_none());
	}
}
