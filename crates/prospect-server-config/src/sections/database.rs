// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration section.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./prospect.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfigLayer {
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		DatabaseConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_url() {
		assert_eq!(DatabaseConfig::default().url, "sqlite:./prospect.db");
	}

	#[test]
	fn test_merge_overrides_url() {
		let mut base = DatabaseConfigLayer {
			url: Some("sqlite:a.db".to_string()),
		};
		base.merge(DatabaseConfigLayer { url: None });
		assert_eq!(base.url.as_deref(), Some("sqlite:a.db"));
		base.merge(DatabaseConfigLayer {
			url: Some("sqlite:b.db".to_string()),
		});
		assert_eq!(base.finalize().url, "sqlite:b.db");
	}
}
