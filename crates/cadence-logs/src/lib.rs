// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Structured invocation event capture for Cadence job runs.
//!
//! Job invocations announce their lifecycle through `tracing` events on the
//! [`INVOCATION_TARGET`] target, each carrying an `event` field of `start`,
//! `progress` or `end`. This crate provides:
//! - [`InvocationEvent`] - One parsed boundary or progress event
//! - [`EventLog`] - A thread-safe ring buffer of recent events
//! - [`InvocationEventLayer`] - A tracing Layer that feeds the buffer
//!
//! # Usage
//!
//! ```ignore
//! use cadence_logs::{EventLog, InvocationEventLayer};
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! let events = EventLog::new(1_000);
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(InvocationEventLayer::new(events.clone()))
//!     .init();
//! ```

mod buffer;
mod entry;
mod layer;

pub use buffer::{EventLog, DEFAULT_CAPACITY};
pub use entry::{EventKind, InvocationEvent, LogLevel};
pub use layer::InvocationEventLayer;

/// Tracing target used for invocation boundary and progress events.
pub const INVOCATION_TARGET: &str = "cadence::invocation";
