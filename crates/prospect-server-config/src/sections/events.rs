// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventsConfigLayer {
	pub queue_capacity: Option<usize>,
}

impl EventsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
	}

	pub fn finalize(self) -> EventsConfig {
		EventsConfig {
			queue_capacity: self.queue_capacity.unwrap_or(1000),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventsConfig {
	/// Events buffered before `publish` hands off to a background send.
	pub queue_capacity: usize,
}

impl Default for EventsConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 1000,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_layer_finalize_defaults() {
		assert_eq!(EventsConfigLayer::default().finalize(), EventsConfig::default());
	}

	#[test]
	fn test_layer_finalize_with_value() {
		let config = EventsConfigLayer {
			queue_capacity: Some(16),
		}
		.finalize();
		assert_eq!(config.queue_capacity, 16);
	}
}
