// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::SqlitePool;

use crate::error::Result;

/// Tables read by the worker. Timestamps are RFC 3339 text; configs are JSON
/// text.
const STATEMENTS: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS job_postings (
		id TEXT PRIMARY KEY,
		title TEXT NOT NULL,
		company TEXT NOT NULL,
		job_posting_url TEXT,
		status TEXT NOT NULL DEFAULT 'active',
		ends_at TEXT,
		created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
		updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS process_step (
		id TEXT PRIMARY KEY,
		process_id TEXT,
		name TEXT NOT NULL,
		status TEXT NOT NULL DEFAULT 'pending',
		"order" INTEGER NOT NULL DEFAULT 0
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS action_definition (
		id TEXT PRIMARY KEY,
		step_id TEXT NOT NULL REFERENCES process_step(id) ON DELETE CASCADE,
		name TEXT NOT NULL,
		is_public INTEGER NOT NULL DEFAULT 0,
		"order" INTEGER NOT NULL DEFAULT 0,
		config TEXT NOT NULL DEFAULT '{}'
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS trigger_definition (
		id TEXT PRIMARY KEY,
		"order" INTEGER NOT NULL DEFAULT 0,
		is_public INTEGER NOT NULL DEFAULT 0,
		created_by TEXT NOT NULL,
		trigger_code TEXT NOT NULL,
		execute_when TEXT,
		execute_at TEXT,
		combinator TEXT,
		config TEXT NOT NULL DEFAULT '{}',
		expiration TEXT,
		step_id TEXT REFERENCES process_step(id) ON DELETE SET NULL
	)
	"#,
	"CREATE INDEX IF NOT EXISTS idx_job_postings_ends_at ON job_postings(ends_at)",
	"CREATE INDEX IF NOT EXISTS idx_action_definition_step ON action_definition(step_id, \"order\")",
	"CREATE INDEX IF NOT EXISTS idx_trigger_definition_code ON trigger_definition(trigger_code, execute_at)",
];

/// Create any missing tables and indexes.
#[tracing::instrument(skip(pool))]
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
	for statement in STATEMENTS {
		sqlx::query(statement).execute(pool).await?;
	}
	tracing::debug!("database schema applied");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn test_apply_schema_is_repeatable() {
		let pool = create_test_pool().await;
		apply_schema(&pool).await.unwrap();
		apply_schema(&pool).await.unwrap();

		let (count,): (i64,) = sqlx::query_as(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
			 ('job_postings', 'process_step', 'action_definition', 'trigger_definition')",
		)
		.fetch_one(&pool)
		.await
		.unwrap();
		assert_eq!(count, 4);
	}
}
