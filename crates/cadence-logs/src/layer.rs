// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tracing layer that captures invocation events into the buffer.

use std::fmt;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::buffer::EventLog;
use crate::entry::{EventKind, InvocationEvent, LogLevel};
use crate::INVOCATION_TARGET;

/// A tracing Layer that records invocation events into an [`EventLog`].
///
/// Only events on [`INVOCATION_TARGET`] with a recognised `event` field are
/// captured; everything else passes through untouched so the layer composes
/// with `fmt::layer()`.
#[derive(Clone)]
pub struct InvocationEventLayer {
	log: EventLog,
}

impl InvocationEventLayer {
	pub fn new(log: EventLog) -> Self {
		Self { log }
	}

	pub fn log(&self) -> &EventLog {
		&self.log
	}
}

impl<S> Layer<S> for InvocationEventLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if metadata.target() != INVOCATION_TARGET {
			return;
		}

		let mut visitor = FieldVisitor::default();
		event.record(&mut visitor);

		let Some(kind) = visitor.event.as_deref().and_then(EventKind::parse) else {
			return;
		};

		self.log.push(InvocationEvent {
			id: 0,
			timestamp: Utc::now(),
			level: LogLevel::from_tracing(metadata.level()),
			kind,
			job_key: visitor.job_key.unwrap_or_default(),
			worker_id: visitor.worker_id.unwrap_or_default(),
			invocation_id: visitor.invocation_id.unwrap_or_default(),
			iteration: visitor.iteration,
			status: visitor.status,
			message: visitor.message.unwrap_or_default(),
		});
	}
}

#[derive(Default)]
struct FieldVisitor {
	event: Option<String>,
	job_key: Option<String>,
	worker_id: Option<String>,
	invocation_id: Option<String>,
	iteration: Option<u64>,
	status: Option<String>,
	message: Option<String>,
}

impl FieldVisitor {
	fn record_string(&mut self, name: &str, value: String) {
		match name {
			"event" => self.event = Some(value),
			"job_key" => self.job_key = Some(value),
			"worker_id" => self.worker_id = Some(value),
			"invocation_id" => self.invocation_id = Some(value),
			"status" => self.status = Some(value),
			"message" => self.message = Some(value),
			"iteration" => self.iteration = value.parse().ok(),
			_ => {}
		}
	}
}

impl Visit for FieldVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		self.record_string(field.name(), format!("{:?}", value));
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		self.record_string(field.name(), value.to_string());
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		if field.name() == "iteration" {
			self.iteration = Some(value);
		}
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		if field.name() == "iteration" {
			self.iteration = u64::try_from(value).ok();
		}
	}
}
