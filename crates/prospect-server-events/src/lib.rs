// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process event bus for Prospect background processing.
//!
//! Producers (scheduled jobs, request handlers) publish typed [`Event`]s; the
//! bus queues them in a bounded FIFO and a single dispatcher fans each event out
//! to every [`Listener`] subscribed to its [`EventType`], one task per listener.
//!
//! # Usage
//!
//! ```ignore
//! use prospect_server_events::{Event, EventBus, EventType};
//!
//! let bus = EventBus::new(1000);
//! bus.subscribe_fn(EventType::ReminderTrigger, "audit", |event| async move {
//!     tracing::info!(event_type = %event.event_type(), "reminder observed");
//! });
//! bus.publish(event);
//! bus.wait_idle().await;
//! ```

pub mod bus;
pub mod error;
pub mod event;
pub mod listener;
pub mod types;

pub use bus::{EventBus, DEFAULT_QUEUE_CAPACITY};
pub use error::EventError;
pub use event::{ApplicationChanged, Event, PostingExpiryNotice, ReminderFired};
pub use listener::{FnListener, Listener};
pub use types::EventType;
