// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::posting::sql_timestamp;
use crate::types::{parse_config, DayRange, TriggerDefinition};

type TriggerRow = (
	String,
	i32,
	bool,
	String,
	String,
	Option<String>,
	Option<DateTime<Utc>>,
	Option<String>,
	String,
	Option<DateTime<Utc>>,
	Option<String>,
);

fn trigger_from_row(row: TriggerRow) -> TriggerDefinition {
	let (
		id,
		order,
		is_public,
		created_by,
		trigger_code,
		execute_when,
		execute_at,
		combinator,
		config,
		expiration,
		step_id,
	) = row;
	let config = parse_config(&config, &id);
	TriggerDefinition {
		id,
		order,
		is_public,
		created_by,
		trigger_code,
		execute_when,
		execute_at,
		combinator,
		config,
		expiration,
		step_id,
	}
}

#[derive(Clone)]
pub struct TriggerRepository {
	pool: SqlitePool,
}

impl TriggerRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Unconditional triggers with `trigger_code` scheduled inside `day`,
	/// earliest first. Triggers with an `execute_when` gate are left to
	/// whatever evaluates that condition.
	#[tracing::instrument(skip(self))]
	pub async fn find_scheduled(&self, trigger_code: &str, day: DayRange) -> Result<Vec<TriggerDefinition>> {
		let rows = sqlx::query_as::<_, TriggerRow>(
			r#"
			SELECT id, "order", is_public, created_by, trigger_code, execute_when,
				execute_at, combinator, config, expiration, step_id
			FROM trigger_definition
			WHERE trigger_code = ?
				AND execute_when IS NULL
				AND execute_at IS NOT NULL
				AND julianday(execute_at) >= julianday(?)
				AND julianday(execute_at) < julianday(?)
			ORDER BY julianday(execute_at) ASC
			"#,
		)
		.bind(trigger_code)
		.bind(sql_timestamp(day.start))
		.bind(sql_timestamp(day.end))
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(trigger_from_row).collect())
	}
}

#[async_trait]
pub trait TriggerStore: Send + Sync {
	async fn find_scheduled(&self, trigger_code: &str, day: DayRange) -> Result<Vec<TriggerDefinition>>;
}

#[async_trait]
impl TriggerStore for TriggerRepository {
	async fn find_scheduled(&self, trigger_code: &str, day: DayRange) -> Result<Vec<TriggerDefinition>> {
		self.find_scheduled(trigger_code, day).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_trigger, TriggerSeed};
	use chrono::{NaiveDate, TimeZone};
	use serde_json::json;

	fn at(day: u32, hour: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
	}

	fn today() -> DayRange {
		DayRange::in_tz(&Utc, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), 1)
	}

	#[tokio::test]
	async fn test_find_scheduled_matches_code_day_and_no_gate() {
		let pool = create_test_pool().await;
		insert_trigger(&pool, &TriggerSeed::reminder("late", at(18, 17))).await;
		insert_trigger(&pool, &TriggerSeed::reminder("early", at(18, 8))).await;
		insert_trigger(&pool, &TriggerSeed::reminder("tomorrow", at(19, 8))).await;
		insert_trigger(&pool, &TriggerSeed::reminder("yesterday", at(17, 23))).await;
		insert_trigger(
			&pool,
			&TriggerSeed {
				execute_when: Some("event".to_string()),
				..TriggerSeed::reminder("gated", at(18, 9))
			},
		)
		.await;
		insert_trigger(
			&pool,
			&TriggerSeed {
				trigger_code: "EMAIL_SENT".to_string(),
				..TriggerSeed::reminder("other-code", at(18, 9))
			},
		)
		.await;
		let repo = TriggerRepository::new(pool);

		let triggers = repo.find_scheduled("REMINDER", today()).await.unwrap();
		let ids: Vec<_> = triggers.iter().map(|t| t.id.as_str()).collect();
		assert_eq!(ids, vec!["early", "late"]);
	}

	#[tokio::test]
	async fn test_find_scheduled_decodes_row() {
		let pool = create_test_pool().await;
		insert_trigger(
			&pool,
			&TriggerSeed {
				step_id: Some("step-1".to_string()),
				config: r#"{"type":"REMINDER","label":"Ping"}"#.to_string(),
				expiration: Some(at(30, 0)),
				..TriggerSeed::reminder("trg-1", at(18, 9))
			},
		)
		.await;
		let repo = TriggerRepository::new(pool);

		let triggers = repo.find_scheduled("REMINDER", today()).await.unwrap();
		assert_eq!(triggers.len(), 1);
		let trigger = &triggers[0];
		assert_eq!(trigger.step_id.as_deref(), Some("step-1"));
		assert_eq!(trigger.config, json!({"type": "REMINDER", "label": "Ping"}));
		assert_eq!(trigger.execute_at, Some(at(18, 9)));
		assert_eq!(trigger.expiration, Some(at(30, 0)));
		assert_eq!(trigger.created_by, "user-1");
	}

	#[tokio::test]
	async fn test_unparsable_config_becomes_empty_object() {
		let pool = create_test_pool().await;
		insert_trigger(
			&pool,
			&TriggerSeed {
				config: "{broken".to_string(),
				..TriggerSeed::reminder("trg-1", at(18, 9))
			},
		)
		.await;
		let repo = TriggerRepository::new(pool);

		let triggers = repo.find_scheduled("REMINDER", today()).await.unwrap();
		assert_eq!(triggers[0].config, json!({}));
	}

	#[tokio::test]
	async fn test_no_matches_is_empty_not_error() {
		let repo = TriggerRepository::new(create_test_pool().await);
		assert!(repo.find_scheduled("REMINDER", today()).await.unwrap().is_empty());
	}
}
