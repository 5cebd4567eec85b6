// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Jobs configuration section.

use serde::{Deserialize, Serialize};

pub const DEFAULT_REMINDER_TRIGGER_CODE: &str = "REMINDER";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobsConfigLayer {
	pub expiration_check_enabled: Option<bool>,
	pub expiring_horizon_days: Option<u32>,
	pub reminder_check_enabled: Option<bool>,
	pub reminder_trigger_code: Option<String>,
}

impl JobsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.expiration_check_enabled.is_some() {
			self.expiration_check_enabled = other.expiration_check_enabled;
		}
		if other.expiring_horizon_days.is_some() {
			self.expiring_horizon_days = other.expiring_horizon_days;
		}
		if other.reminder_check_enabled.is_some() {
			self.reminder_check_enabled = other.reminder_check_enabled;
		}
		if other.reminder_trigger_code.is_some() {
			self.reminder_trigger_code = other.reminder_trigger_code;
		}
	}

	pub fn finalize(self) -> JobsConfig {
		JobsConfig {
			expiration_check_enabled: self.expiration_check_enabled.unwrap_or(true),
			expiring_horizon_days: self.expiring_horizon_days.unwrap_or(3),
			reminder_check_enabled: self.reminder_check_enabled.unwrap_or(true),
			reminder_trigger_code: self
				.reminder_trigger_code
				.unwrap_or_else(|| DEFAULT_REMINDER_TRIGGER_CODE.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobsConfig {
	pub expiration_check_enabled: bool,
	/// Postings ending within this many days count as expiring soon.
	pub expiring_horizon_days: u32,
	pub reminder_check_enabled: bool,
	pub reminder_trigger_code: String,
}

impl Default for JobsConfig {
	fn default() -> Self {
		JobsConfigLayer::default().finalize()
	}
}
