// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed action configs.
//!
//! The `type` tag is inspected exactly once, in [`decode_config`]. Every
//! kind-specific field is optional at this layer; required-field checks
//! happen in the executor so their failures carry a readable message.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
	SendEmail,
	CreateCalendarEvent,
	CreateTask,
	CallReminder,
	Webhook,
	UpdateStepStatus,
}

impl ActionKind {
	pub const ALL: [ActionKind; 6] = [
		ActionKind::SendEmail,
		ActionKind::CreateCalendarEvent,
		ActionKind::CreateTask,
		ActionKind::CallReminder,
		ActionKind::Webhook,
		ActionKind::UpdateStepStatus,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ActionKind::SendEmail => "SEND_EMAIL",
			ActionKind::CreateCalendarEvent => "CREATE_CALENDAR_EVENT",
			ActionKind::CreateTask => "CREATE_TASK",
			ActionKind::CallReminder => "CALL_REMINDER",
			ActionKind::Webhook => "WEBHOOK",
			ActionKind::UpdateStepStatus => "UPDATE_STEP_STATUS",
		}
	}

	pub fn from_tag(tag: &str) -> Option<Self> {
		ActionKind::ALL.into_iter().find(|k| k.as_str() == tag)
	}
}

impl fmt::Display for ActionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailConfig {
	/// Recipient type: CUSTOM, PROCESS_OWNER, COUNTERPART, ALL_COUNTERPARTS or SYSTEM.
	pub to: Option<String>,
	pub email: Option<String>,
	pub subject: Option<String>,
	pub content: Option<String>,
	pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventConfig {
	pub title: Option<String>,
	/// RFC 3339 start time.
	pub start: Option<String>,
	/// Any JSON number; fractional minutes are kept to the millisecond.
	pub duration_minutes: Option<f64>,
	pub description: Option<String>,
	pub location: Option<String>,
	#[serde(default)]
	pub attendees: Vec<String>,
	pub color_id: Option<String>,
	pub calendar_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskConfig {
	pub title: Option<String>,
	pub description: Option<String>,
	/// RFC 3339 due time.
	pub datetime: Option<String>,
	pub assignee: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReminderConfig {
	/// Any JSON number, but it must hold a whole value (`2` or `2.0`).
	pub days_from_now: Option<f64>,
	pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
	pub url: Option<String>,
	pub method: Option<String>,
	#[serde(default)]
	pub headers: BTreeMap<String, String>,
	pub payload: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStepStatusConfig {
	pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionConfig {
	SendEmail(SendEmailConfig),
	CreateCalendarEvent(CalendarEventConfig),
	CreateTask(CreateTaskConfig),
	CallReminder(CallReminderConfig),
	Webhook(WebhookConfig),
	UpdateStepStatus(UpdateStepStatusConfig),
}

impl ActionConfig {
	pub fn kind(&self) -> ActionKind {
		match self {
			ActionConfig::SendEmail(_) => ActionKind::SendEmail,
			ActionConfig::CreateCalendarEvent(_) => ActionKind::CreateCalendarEvent,
			ActionConfig::CreateTask(_) => ActionKind::CreateTask,
			ActionConfig::CallReminder(_) => ActionKind::CallReminder,
			ActionConfig::Webhook(_) => ActionKind::Webhook,
			ActionConfig::UpdateStepStatus(_) => ActionKind::UpdateStepStatus,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedConfig {
	/// Null, or an object with no keys.
	Empty,
	/// Non-empty config without a string `type` tag.
	MissingKind,
	Unknown(String),
	Known(ActionConfig),
}

pub fn decode_config(value: &Value) -> Result<DecodedConfig, ActionError> {
	let object = match value {
		Value::Null => return Ok(DecodedConfig::Empty),
		Value::Object(map) if map.is_empty() => return Ok(DecodedConfig::Empty),
		Value::Object(map) => map,
		_ => return Ok(DecodedConfig::MissingKind),
	};

	let Some(tag) = object.get("type").and_then(Value::as_str) else {
		return Ok(DecodedConfig::MissingKind);
	};
	let Some(kind) = ActionKind::from_tag(tag) else {
		return Ok(DecodedConfig::Unknown(tag.to_string()));
	};

	let invalid = |source| ActionError::InvalidConfig { kind, source };
	let config = match kind {
		ActionKind::SendEmail => {
			ActionConfig::SendEmail(serde_json::from_value(value.clone()).map_err(invalid)?)
		}
		ActionKind::CreateCalendarEvent => {
			ActionConfig::CreateCalendarEvent(serde_json::from_value(value.clone()).map_err(invalid)?)
		}
		ActionKind::CreateTask => {
			ActionConfig::CreateTask(serde_json::from_value(value.clone()).map_err(invalid)?)
		}
		ActionKind::CallReminder => {
			ActionConfig::CallReminder(serde_json::from_value(value.clone()).map_err(invalid)?)
		}
		ActionKind::Webhook => {
			ActionConfig::Webhook(serde_json::from_value(value.clone()).map_err(invalid)?)
		}
		ActionKind::UpdateStepStatus => {
			ActionConfig::UpdateStepStatus(serde_json::from_value(value.clone()).map_err(invalid)?)
		}
	};

	Ok(DecodedConfig::Known(config))
}
