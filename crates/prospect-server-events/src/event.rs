// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed event payloads.
//!
//! Every [`EventType`] has exactly one payload shape. Untyped payloads coming
//! from outside the process are validated once, in [`Event::from_json`], so a
//! listener never has to guess what it was handed.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::types::EventType;

/// A job posting crossing (or approaching) its expiration date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingExpiryNotice {
	pub job_id: String,
	pub title: String,
	pub company_name: String,
	pub ends_at: DateTime<Utc>,
	#[serde(default)]
	pub url: Option<String>,
}

/// A reminder trigger that is due today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderFired {
	pub trigger_id: String,
	pub trigger_code: String,
	pub execute_at: DateTime<Utc>,
	/// Raw trigger config; decoded by the consumer.
	#[serde(default)]
	pub config: serde_json::Value,
	#[serde(default)]
	pub step_id: Option<String>,
	pub created_by: String,
	#[serde(default)]
	pub order: i32,
	#[serde(default)]
	pub expiration: Option<DateTime<Utc>>,
}

/// A change in a candidate application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationChanged {
	pub application_id: String,
	#[serde(default)]
	pub job_posting_id: Option<String>,
	#[serde(default)]
	pub candidate_name: Option<String>,
	#[serde(default)]
	pub candidate_email: Option<String>,
	#[serde(default)]
	pub stage: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	ApplicationCreated(ApplicationChanged),
	ApplicationStageChanged(ApplicationChanged),
	ApplicationRejected(ApplicationChanged),
	ApplicationHired(ApplicationChanged),
	JobPostingExpiringSoon(PostingExpiryNotice),
	JobPostingExpired(PostingExpiryNotice),
	ReminderTrigger(ReminderFired),
}

impl Event {
	pub fn event_type(&self) -> EventType {
		match self {
			Event::ApplicationCreated(_) => EventType::ApplicationCreated,
			Event::ApplicationStageChanged(_) => EventType::ApplicationStageChanged,
			Event::ApplicationRejected(_) => EventType::ApplicationRejected,
			Event::ApplicationHired(_) => EventType::ApplicationHired,
			Event::JobPostingExpiringSoon(_) => EventType::JobPostingExpiringSoon,
			Event::JobPostingExpired(_) => EventType::JobPostingExpired,
			Event::ReminderTrigger(_) => EventType::ReminderTrigger,
		}
	}

	/// Build an event from an untyped JSON payload.
	///
	/// Missing optional keys (for example `stepId`) decode to `None`; missing
	/// required keys or wrongly-typed values are rejected here rather than in
	/// the listener.
	pub fn from_json(event_type: EventType, payload: serde_json::Value) -> Result<Self, EventError> {
		let event = match event_type {
			EventType::ApplicationCreated => Event::ApplicationCreated(decode(event_type, payload)?),
			EventType::ApplicationStageChanged => {
				Event::ApplicationStageChanged(decode(event_type, payload)?)
			}
			EventType::ApplicationRejected => Event::ApplicationRejected(decode(event_type, payload)?),
			EventType::ApplicationHired => Event::ApplicationHired(decode(event_type, payload)?),
			EventType::JobPostingExpiringSoon => {
				Event::JobPostingExpiringSoon(decode(event_type, payload)?)
			}
			EventType::JobPostingExpired => Event::JobPostingExpired(decode(event_type, payload)?),
			EventType::ReminderTrigger => Event::ReminderTrigger(decode(event_type, payload)?),
		};
		Ok(event)
	}
}

fn decode<T: DeserializeOwned>(
	event_type: EventType,
	payload: serde_json::Value,
) -> Result<T, EventError> {
	serde_json::from_value(payload).map_err(|source| EventError::InvalidPayload { event_type, source })
}
