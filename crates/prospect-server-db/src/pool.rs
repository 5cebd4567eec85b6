// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

/// Opens the worker's SQLite database, creating the file on first use.
/// Journaling is WAL so the scheduled jobs and listeners can read while a
/// posting is being marked expired.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::InvalidUrl(e.to_string()))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!(max_connections = pool.options().get_max_connections(), "sqlite pool ready");
	Ok(pool)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_create_pool_creates_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("prospect.db");
		let url = format!("sqlite:{}", path.display());

		let pool = create_pool(&url).await.unwrap();
		let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
		assert_eq!(one, 1);
		assert!(path.exists());
	}

	#[tokio::test]
	async fn test_create_pool_rejects_invalid_url() {
		let err = create_pool("postgres://localhost/prospect").await.unwrap_err();
		assert!(matches!(err, DbError::InvalidUrl(_)));
	}
}
