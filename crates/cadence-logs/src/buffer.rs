// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Thread-safe ring buffer for invocation events.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::entry::{EventKind, InvocationEvent};

/// Default buffer capacity.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// A thread-safe ring buffer that stores recent invocation events.
///
/// When the buffer is full, oldest events are evicted to make room for new ones.
/// Supports both snapshot queries and real-time streaming via broadcast channel.
#[derive(Clone)]
pub struct EventLog {
	inner: Arc<EventLogInner>,
}

struct EventLogInner {
	events: RwLock<VecDeque<InvocationEvent>>,
	capacity: usize,
	next_id: AtomicU64,
	sender: broadcast::Sender<InvocationEvent>,
}

impl EventLog {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(1024);
		Self {
			inner: Arc::new(EventLogInner {
				events: RwLock::new(VecDeque::with_capacity(capacity)),
				capacity,
				next_id: AtomicU64::new(1),
				sender,
			}),
		}
	}

	pub fn with_default_capacity() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}

	/// Push an event into the buffer, assigning it the next sequential ID.
	///
	/// If the buffer is full, the oldest event is evicted.
	pub fn push(&self, mut event: InvocationEvent) {
		event.id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

		{
			let mut events = self.inner.events.write();
			if events.len() >= self.inner.capacity {
				events.pop_front();
			}
			events.push_back(event.clone());
		}

		// Broadcast to subscribers (ignore errors if no subscribers)
		let _ = self.inner.sender.send(event);
	}

	/// Snapshot of every buffered event, oldest first.
	pub fn events(&self) -> Vec<InvocationEvent> {
		self.inner.events.read().iter().cloned().collect()
	}

	/// Events belonging to one invocation, oldest first.
	pub fn for_invocation(&self, invocation_id: &str) -> Vec<InvocationEvent> {
		self
			.inner
			.events
			.read()
			.iter()
			.filter(|e| e.invocation_id == invocation_id)
			.cloned()
			.collect()
	}

	/// Count events of `kind` for one invocation.
	pub fn count(&self, invocation_id: &str, kind: EventKind) -> usize {
		self
			.inner
			.events
			.read()
			.iter()
			.filter(|e| e.invocation_id == invocation_id && e.kind == kind)
			.count()
	}

	pub fn len(&self) -> usize {
		self.inner.events.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.events.read().is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.inner.capacity
	}

	/// Subscribe to events as they are pushed.
	pub fn subscribe(&self) -> broadcast::Receiver<InvocationEvent> {
		self.inner.sender.subscribe()
	}

	pub fn clear(&self) {
		self.inner.events.write().clear();
	}
}

impl Default for EventLog {
	fn default() -> Self {
		Self::with_default_capacity()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::entry::LogLevel;
	use chrono::Utc;

	fn event(invocation_id: &str, kind: EventKind, iteration: Option<u64>) -> InvocationEvent {
		InvocationEvent {
			id: 0,
			timestamp: Utc::now(),
			level: LogLevel::Info,
			kind,
			job_key: "DEFAULT.test".to_string(),
			worker_id: "worker-1".to_string(),
			invocation_id: invocation_id.to_string(),
			iteration,
			status: None,
			message: String::new(),
		}
	}

	#[test]
	fn test_push_assigns_sequential_ids() {
		let log = EventLog::new(100);

		log.push(event("a", EventKind::Start, None));
		log.push(event("a", EventKind::Progress, Some(0)));

		let events = log.events();
		assert_eq!(events.len(), 2);
		assert_eq!(events[0].id, 1);
		assert_eq!(events[1].id, 2);
	}

	#[test]
	fn test_capacity_eviction() {
		let log = EventLog::new(3);

		for i in 0..4 {
			log.push(event("a", EventKind::Progress, Some(i)));
		}

		assert_eq!(log.len(), 3);
		let events = log.events();
		assert_eq!(events[0].iteration, Some(1));
		assert_eq!(events[2].iteration, Some(3));
	}

	#[test]
	fn test_filter_by_invocation() {
		let log = EventLog::new(100);

		log.push(event("a", EventKind::Start, None));
		log.push(event("b", EventKind::Start, None));
		log.push(event("a", EventKind::Progress, Some(0)));
		log.push(event("a", EventKind::Progress, Some(1)));

		assert_eq!(log.for_invocation("a").len(), 3);
		assert_eq!(log.count("a", EventKind::Progress), 2);
		assert_eq!(log.count("b", EventKind::Progress), 0);
	}

	#[test]
	fn test_clear() {
		let log = EventLog::new(10);
		log.push(event("a", EventKind::Start, None));
		log.clear();
		assert!(log.is_empty());
		assert_eq!(log.capacity(), 10);
	}

	#[tokio::test]
	async fn test_broadcast_subscription() {
		let log = EventLog::new(100);
		let mut rx = log.subscribe();

		log.push(event("a", EventKind::End, None));

		let received = rx.recv().await.unwrap();
		assert_eq!(received.kind, EventKind::End);
		assert_eq!(received.invocation_id, "a");
	}
}
