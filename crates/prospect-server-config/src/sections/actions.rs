// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionsConfigLayer {
	pub listener_timeout_secs: Option<u64>,
	pub webhook_timeout_secs: Option<u64>,
}

impl ActionsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.listener_timeout_secs.is_some() {
			self.listener_timeout_secs = other.listener_timeout_secs;
		}
		if other.webhook_timeout_secs.is_some() {
			self.webhook_timeout_secs = other.webhook_timeout_secs;
		}
	}

	pub fn finalize(self) -> ActionsConfig {
		ActionsConfig {
			listener_timeout_secs: self.listener_timeout_secs.unwrap_or(300),
			webhook_timeout_secs: self.webhook_timeout_secs.unwrap_or(30),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionsConfig {
	/// Upper bound on one reminder listener invocation.
	pub listener_timeout_secs: u64,
	/// Per-request timeout for outbound webhooks.
	pub webhook_timeout_secs: u64,
}

impl ActionsConfig {
	pub fn listener_timeout(&self) -> Duration {
		Duration::from_secs(self.listener_timeout_secs)
	}

	pub fn webhook_timeout(&self) -> Duration {
		Duration::from_secs(self.webhook_timeout_secs)
	}
}

impl Default for ActionsConfig {
	fn default() -> Self {
		Self {
			listener_timeout_secs: 300,
			webhook_timeout_secs: 30,
		}
	}
}
