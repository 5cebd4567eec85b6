// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EventError;

/// Closed set of event kinds carried by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
	// Application events
	#[serde(rename = "application.created")]
	ApplicationCreated,
	#[serde(rename = "application.stage_changed")]
	ApplicationStageChanged,
	#[serde(rename = "application.rejected")]
	ApplicationRejected,
	#[serde(rename = "application.hired")]
	ApplicationHired,

	// Job posting events
	#[serde(rename = "job_posting.expiring_soon")]
	JobPostingExpiringSoon,
	#[serde(rename = "job_posting.expired")]
	JobPostingExpired,

	// Trigger events
	#[serde(rename = "trigger.reminder")]
	ReminderTrigger,
}

impl EventType {
	pub const ALL: [EventType; 7] = [
		EventType::ApplicationCreated,
		EventType::ApplicationStageChanged,
		EventType::ApplicationRejected,
		EventType::ApplicationHired,
		EventType::JobPostingExpiringSoon,
		EventType::JobPostingExpired,
		EventType::ReminderTrigger,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			EventType::ApplicationCreated => "application.created",
			EventType::ApplicationStageChanged => "application.stage_changed",
			EventType::ApplicationRejected => "application.rejected",
			EventType::ApplicationHired => "application.hired",
			EventType::JobPostingExpiringSoon => "job_posting.expiring_soon",
			EventType::JobPostingExpired => "job_posting.expired",
			EventType::ReminderTrigger => "trigger.reminder",
		}
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EventType {
	type Err = EventError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		EventType::ALL
			.into_iter()
			.find(|t| t.as_str() == s)
			.ok_or_else(|| EventError::UnknownEventType(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_matches_wire_name() {
		assert_eq!(EventType::ReminderTrigger.to_string(), "trigger.reminder");
		assert_eq!(
			EventType::JobPostingExpiringSoon.to_string(),
			"job_posting.expiring_soon"
		);
	}

	#[test]
	fn test_from_str_accepts_every_known_type() {
		for event_type in EventType::ALL {
			let parsed: EventType = event_type.as_str().parse().unwrap();
			assert_eq!(parsed, event_type);
		}
	}

	#[test]
	fn test_from_str_rejects_unknown_type() {
		let err = "job_posting.archived".parse::<EventType>().unwrap_err();
		assert!(matches!(err, EventError::UnknownEventType(ref s) if s == "job_posting.archived"));
	}

	#[test]
	fn test_serde_uses_wire_name() {
		let json = serde_json::to_string(&EventType::JobPostingExpired).unwrap();
		assert_eq!(json, "\"job_posting.expired\"");
		let back: EventType = serde_json::from_str(&json).unwrap();
		assert_eq!(back, EventType::JobPostingExpired);
	}
}
