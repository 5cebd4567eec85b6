// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Failures surfaced by the posting, trigger and step repositories.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("query failed: {0}")]
	Query(#[from] sqlx::Error),

	/// The connection string could not be parsed as a SQLite URL.
	#[error("invalid database url: {0}")]
	InvalidUrl(String),

	/// A stored config column held JSON that does not match its declared type.
	#[error("malformed stored config: {0}")]
	MalformedConfig(#[from] serde_json::Error),

	#[error("store unavailable: {0}")]
	Unavailable(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
