// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded-queue event bus with concurrent fan-out.
//!
//! # Backpressure
//!
//! `publish` never waits. It first tries the bounded queue; when the queue is
//! full the send is handed to a detached task that waits for room. Events that
//! fit in the queue keep their publish order. Deferred events may land after
//! events published later, and nothing bounds how many deferred sends can be
//! parked at once.
//!
//! # Delivery
//!
//! One dispatcher drains the queue in FIFO order. For each event it snapshots
//! the listeners registered for that type and spawns one task per listener.
//! Listeners subscribed after the snapshot do not see the event. Listener
//! start order follows queue order; completion order is unspecified.

use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tracing::{debug, error, instrument, trace, warn};

use crate::error::EventError;
use crate::event::Event;
use crate::listener::{FnListener, Listener};
use crate::types::EventType;

/// Default capacity of the primary queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

type ListenerMap = HashMap<EventType, Vec<Arc<dyn Listener>>>;

/// Handle to a running event bus. Clones share the same queue and listeners.
#[derive(Clone)]
pub struct EventBus {
	tx: mpsc::Sender<Arc<Event>>,
	shared: Arc<Shared>,
	runtime: Handle,
}

struct Shared {
	listeners: RwLock<ListenerMap>,
	/// Accepted events not yet dispatched plus listener invocations still running.
	pending: watch::Sender<usize>,
}

impl Shared {
	fn begin(&self, n: usize) {
		if n > 0 {
			self.pending.send_modify(|p| *p += n);
		}
	}

	fn finish(&self, n: usize) {
		self.pending.send_modify(|p| *p = p.saturating_sub(n));
	}

	fn snapshot(&self, event_type: EventType) -> Vec<Arc<dyn Listener>> {
		self
			.listeners
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&event_type)
			.cloned()
			.unwrap_or_default()
	}
}

impl EventBus {
	/// Create a bus and spawn its dispatcher.
	///
	/// Must be called from within a Tokio runtime. A capacity of zero is
	/// treated as one.
	pub fn new(queue_capacity: usize) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity.max(1));
		let (pending, _) = watch::channel(0usize);
		let shared = Arc::new(Shared {
			listeners: RwLock::new(HashMap::new()),
			pending,
		});
		let runtime = Handle::current();

		runtime.spawn(dispatch_loop(rx, Arc::clone(&shared)));

		Self {
			tx,
			shared,
			runtime,
		}
	}

	/// Register a listener for one event type. Safe to call while events are
	/// being dispatched; there is no unsubscribe.
	pub fn subscribe(&self, event_type: EventType, listener: Arc<dyn Listener>) {
		debug!(event_type = %event_type, listener = listener.name(), "listener subscribed");
		self
			.shared
			.listeners
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.entry(event_type)
			.or_default()
			.push(listener);
	}

	/// Register an async closure as a listener.
	pub fn subscribe_fn<F, Fut>(&self, event_type: EventType, name: impl Into<String>, f: F)
	where
		F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		self.subscribe(event_type, Arc::new(FnListener::new(name, f)));
	}

	pub fn listener_count(&self, event_type: EventType) -> usize {
		self
			.shared
			.listeners
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&event_type)
			.map_or(0, Vec::len)
	}

	/// Queue an event for dispatch without waiting.
	#[instrument(skip(self, event), fields(event_type = %event.event_type()))]
	pub fn publish(&self, event: Event) {
		self.shared.begin(1);

		match self.tx.try_send(Arc::new(event)) {
			Ok(()) => trace!("event queued"),
			Err(TrySendError::Full(event)) => {
				debug!("event queue full, deferring publish");
				let tx = self.tx.clone();
				let shared = Arc::clone(&self.shared);
				self.runtime.spawn(async move {
					if tx.send(event).await.is_err() {
						shared.finish(1);
						warn!("event bus closed before deferred event was queued");
					}
				});
			}
			Err(TrySendError::Closed(_)) => {
				self.shared.finish(1);
				warn!("event dispatcher is not running, event dropped");
			}
		}
	}

	/// Publish a payload that arrived untyped (CLI, another process). It is
	/// decoded once here; a mismatched payload is rejected and nothing is
	/// queued.
	pub fn publish_json(&self, event_type: &str, payload: serde_json::Value) -> Result<(), EventError> {
		let event_type: EventType = event_type.parse()?;
		self.publish(Event::from_json(event_type, payload)?);
		Ok(())
	}

	/// Wait until every accepted event has been dispatched and every listener
	/// invocation started for it has returned.
	///
	/// Publishing continues to work while a caller waits. A listener that never
	/// returns keeps this pending forever; bound it with a timeout.
	pub async fn wait_idle(&self) {
		let mut rx = self.shared.pending.subscribe();
		let _ = rx.wait_for(|pending| *pending == 0).await;
	}
}

async fn dispatch_loop(mut rx: mpsc::Receiver<Arc<Event>>, shared: Arc<Shared>) {
	while let Some(event) = rx.recv().await {
		let event_type = event.event_type();
		let listeners = shared.snapshot(event_type);

		if listeners.is_empty() {
			trace!(event_type = %event_type, "no listeners for event");
		}

		shared.begin(listeners.len());
		for listener in listeners {
			let event = Arc::clone(&event);
			let shared = Arc::clone(&shared);

			tokio::spawn(async move {
				let outcome = AssertUnwindSafe(listener.handle(event)).catch_unwind().await;
				if let Err(panic) = outcome {
					error!(
						listener = listener.name(),
						event_type = %event_type,
						panic = %panic_message(panic.as_ref()),
						"listener panicked"
					);
				}
				shared.finish(1);
			});
		}

		// The event itself is done once every listener has been started.
		shared.finish(1);
	}

	debug!("event dispatcher stopped");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(s) = panic.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic payload".to_string()
	}
}
