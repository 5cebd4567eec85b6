// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const POSTING_STATUS_EXPIRED: &str = "expired";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
	pub id: String,
	pub title: String,
	pub company_name: String,
	pub url: Option<String>,
	pub status: String,
	pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
	pub id: String,
	pub order: i32,
	pub is_public: bool,
	pub created_by: String,
	pub trigger_code: String,
	pub execute_when: Option<String>,
	pub execute_at: Option<DateTime<Utc>>,
	pub combinator: Option<String>,
	pub config: Value,
	pub expiration: Option<DateTime<Utc>>,
	pub step_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
	pub id: String,
	pub step_id: String,
	pub name: String,
	pub is_public: bool,
	pub order: i32,
	pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStep {
	pub id: String,
	pub process_id: Option<String>,
	pub name: String,
	pub status: String,
	pub order: i32,
	/// Ascending by `order`. Empty until joined with the step's actions.
	#[serde(default)]
	pub actions: Vec<ActionDefinition>,
}

/// Reminder trigger settings, keyed by `"type": "REMINDER"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderTriggerConfig {
	pub label: Option<String>,
	pub description: Option<String>,
	pub to: Option<String>,
	pub from: Option<String>,
	pub combinator: Option<String>,
	#[serde(default)]
	pub conditions: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReminderTriggerConfig {
	pub note: Option<String>,
	pub days_from_now: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerConfig {
	Reminder(ReminderTriggerConfig),
	CallReminder(CallReminderTriggerConfig),
	/// A tag this worker does not interpret.
	Other(String),
	/// No `type` tag at all (including an empty config).
	Untagged,
}

impl TriggerConfig {
	pub fn decode(value: &Value) -> Result<Self, serde_json::Error> {
		let Some(tag) = value.get("type").and_then(Value::as_str) else {
			return Ok(TriggerConfig::Untagged);
		};

		match tag {
			"REMINDER" => Ok(TriggerConfig::Reminder(serde_json::from_value(value.clone())?)),
			"CALL_REMINDER" => Ok(TriggerConfig::CallReminder(serde_json::from_value(
				value.clone(),
			)?)),
			other => Ok(TriggerConfig::Other(other.to_string())),
		}
	}
}

/// Half-open UTC interval `[start, end)` covering whole calendar days in some
/// time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
	pub start: DateTime<Utc>,
	pub end: DateTime<Utc>,
}

impl DayRange {
	/// `days` consecutive days starting at `first`, in `tz`.
	pub fn in_tz<Tz: TimeZone>(tz: &Tz, first: NaiveDate, days: u64) -> Self {
		let start = start_of_day(tz, first);
		let end = first
			.checked_add_days(Days::new(days.max(1)))
			.map(|last| start_of_day(tz, last))
			.unwrap_or(DateTime::<Utc>::MAX_UTC);
		Self { start, end }
	}

	/// A single day in the host's local time zone.
	pub fn local_day(date: NaiveDate) -> Self {
		Self::in_tz(&Local, date, 1)
	}

	pub fn contains(&self, ts: DateTime<Utc>) -> bool {
		self.start <= ts && ts < self.end
	}
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
	// Midnight can fall in a DST gap; take the first valid hour after it.
	(0..3)
		.find_map(|hour| {
			let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
			tz.from_local_datetime(&date.and_time(time)).earliest()
		})
		.map(|dt| dt.with_timezone(&Utc))
		.unwrap_or_else(|| date.and_time(NaiveTime::MIN).and_utc())
}

pub(crate) fn parse_config(raw: &str, owner: &str) -> Value {
	match serde_json::from_str(raw) {
		Ok(value) => value,
		Err(e) => {
			tracing::warn!(owner, error = %e, "unparsable config, treating as empty");
			Value::Object(Default::default())
		}
	}
}
