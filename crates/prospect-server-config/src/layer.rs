// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::sections::{
	ActionsConfigLayer, DatabaseConfigLayer, EventsConfigLayer, JobsConfigLayer, LoggingConfigLayer,
	SchedulerConfigLayer,
};

/// Partial configuration from one source. Absent sections and fields leave
/// lower-precedence values in place when merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub events: Option<EventsConfigLayer>,
	#[serde(default)]
	pub scheduler: Option<SchedulerConfigLayer>,
	#[serde(default)]
	pub jobs: Option<JobsConfigLayer>,
	#[serde(default)]
	pub actions: Option<ActionsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(other)) => merge(existing, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.events, other.events, EventsConfigLayer::merge);
		merge_section(&mut self.scheduler, other.scheduler, SchedulerConfigLayer::merge);
		merge_section(&mut self.jobs, other.jobs, JobsConfigLayer::merge);
		merge_section(&mut self.actions, other.actions, ActionsConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_keeps_fields_missing_from_overlay() {
		let mut base: ServerConfigLayer = toml::from_str(
			r#"
[database]
url = "sqlite:/var/lib/prospect/base.db"

[jobs]
expiring_horizon_days = 5
reminder_trigger_code = "NUDGE"
"#,
		)
		.unwrap();
		let overlay: ServerConfigLayer = toml::from_str(
			r#"
[jobs]
expiring_horizon_days = 7
"#,
		)
		.unwrap();

		base.merge(overlay);

		let jobs = base.jobs.unwrap();
		assert_eq!(jobs.expiring_horizon_days, Some(7));
		assert_eq!(jobs.reminder_trigger_code.as_deref(), Some("NUDGE"));
		assert_eq!(
			base.database.unwrap().url.as_deref(),
			Some("sqlite:/var/lib/prospect/base.db")
		);
	}

	#[test]
	fn test_merge_into_empty_takes_overlay_section() {
		let mut base = ServerConfigLayer::default();
		let overlay: ServerConfigLayer = toml::from_str("[events]\nqueue_capacity = 10\n").unwrap();
		base.merge(overlay);
		assert_eq!(base.events.unwrap().queue_capacity, Some(10));
	}
}
