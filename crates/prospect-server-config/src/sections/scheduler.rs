// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scheduler configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfigLayer {
	pub stop_timeout_secs: Option<u64>,
	pub period_secs: Option<u64>,
}

impl SchedulerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.stop_timeout_secs.is_some() {
			self.stop_timeout_secs = other.stop_timeout_secs;
		}
		if other.period_secs.is_some() {
			self.period_secs = other.period_secs;
		}
	}

	pub fn finalize(self) -> SchedulerConfig {
		SchedulerConfig {
			stop_timeout_secs: self.stop_timeout_secs.unwrap_or(30),
			period_secs: self.period_secs.unwrap_or(86400), // 24 hours
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
	/// How long `stop` waits for in-flight runs.
	pub stop_timeout_secs: u64,
	/// Interval between scheduled runs after the first midnight.
	pub period_secs: u64,
}

impl SchedulerConfig {
	pub fn stop_timeout(&self) -> Duration {
		Duration::from_secs(self.stop_timeout_secs)
	}

	pub fn period(&self) -> Duration {
		Duration::from_secs(self.period_secs)
	}
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			stop_timeout_secs: 30,
			period_secs: 86400, // 24 hours
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = SchedulerConfigLayer::default().finalize();
		assert_eq!(config, SchedulerConfig::default());
		assert_eq!(config.period(), Duration::from_secs(24 * 60 * 60));
		assert_eq!(config.stop_timeout(), Duration::from_secs(30));
	}

	#[test]
	fn test_merge_overwrites_only_present_fields() {
		let mut base = SchedulerConfigLayer {
			stop_timeout_secs: Some(10),
			period_secs: Some(60),
		};
		base.merge(SchedulerConfigLayer {
			stop_timeout_secs: None,
			period_secs: Some(120),
		});
		assert_eq!(base.stop_timeout_secs, Some(10));
		assert_eq!(base.period_secs, Some(120));
	}
}
