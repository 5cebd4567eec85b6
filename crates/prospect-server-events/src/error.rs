// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::types::EventType;

#[derive(Error, Debug)]
pub enum EventError {
	#[error("unknown event type: {0}")]
	UnknownEventType(String),

	#[error("invalid payload for {event_type}: {source}")]
	InvalidPayload {
		event_type: EventType,
		#[source]
		source: serde_json::Error,
	},
}
