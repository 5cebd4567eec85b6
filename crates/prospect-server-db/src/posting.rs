// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::types::{DayRange, JobPosting, POSTING_STATUS_EXPIRED};

type PostingRow = (
	String,
	String,
	String,
	Option<String>,
	String,
	Option<DateTime<Utc>>,
);

fn posting_from_row(row: PostingRow) -> JobPosting {
	let (id, title, company_name, url, status, ends_at) = row;
	JobPosting {
		id,
		title,
		company_name,
		url,
		status,
		ends_at,
	}
}

pub(crate) fn sql_timestamp(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone)]
pub struct PostingRepository {
	pool: SqlitePool,
}

impl PostingRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Postings whose end date is before `before` and are not yet marked
	/// expired, most recently ended first.
	#[tracing::instrument(skip(self))]
	pub async fn find_expired(&self, before: DateTime<Utc>) -> Result<Vec<JobPosting>> {
		let rows = sqlx::query_as::<_, PostingRow>(
			r#"
			SELECT id, title, company, job_posting_url, status, ends_at
			FROM job_postings
			WHERE ends_at IS NOT NULL
				AND julianday(ends_at) < julianday(?)
				AND status != ?
			ORDER BY julianday(ends_at) DESC
			"#,
		)
		.bind(sql_timestamp(before))
		.bind(POSTING_STATUS_EXPIRED)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(posting_from_row).collect())
	}

	/// Postings ending inside `window` that are not marked expired, soonest
	/// first.
	#[tracing::instrument(skip(self))]
	pub async fn find_expiring(&self, window: DayRange) -> Result<Vec<JobPosting>> {
		let rows = sqlx::query_as::<_, PostingRow>(
			r#"
			SELECT id, title, company, job_posting_url, status, ends_at
			FROM job_postings
			WHERE ends_at IS NOT NULL
				AND julianday(ends_at) >= julianday(?)
				AND julianday(ends_at) < julianday(?)
				AND status != ?
			ORDER BY julianday(ends_at) ASC
			"#,
		)
		.bind(sql_timestamp(window.start))
		.bind(sql_timestamp(window.end))
		.bind(POSTING_STATUS_EXPIRED)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(posting_from_row).collect())
	}

	/// Returns `false` if the posting does not exist or is already expired.
	#[tracing::instrument(skip(self))]
	pub async fn mark_expired(&self, id: &str) -> Result<bool> {
		let now = sql_timestamp(Utc::now());
		let result = sqlx::query(
			"UPDATE job_postings SET status = ?, updated_at = ? WHERE id = ? AND status != ?",
		)
		.bind(POSTING_STATUS_EXPIRED)
		.bind(&now)
		.bind(id)
		.bind(POSTING_STATUS_EXPIRED)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
pub trait PostingStore: Send + Sync {
	async fn find_expired(&self, before: DateTime<Utc>) -> Result<Vec<JobPosting>>;
	async fn find_expiring(&self, window: DayRange) -> Result<Vec<JobPosting>>;
	async fn mark_expired(&self, id: &str) -> Result<bool>;
}

#[async_trait]
impl PostingStore for PostingRepository {
	async fn find_expired(&self, before: DateTime<Utc>) -> Result<Vec<JobPosting>> {
		self.find_expired(before).await
	}

	async fn find_expiring(&self, window: DayRange) -> Result<Vec<JobPosting>> {
		self.find_expiring(window).await
	}

	async fn mark_expired(&self, id: &str) -> Result<bool> {
		self.mark_expired(id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_posting};
	use chrono::{NaiveDate, TimeZone};

	fn at(day: u32, hour: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap()
	}

	fn today() -> NaiveDate {
		NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
	}

	#[tokio::test]
	async fn test_find_expired_excludes_today_and_already_expired() {
		let pool = create_test_pool().await;
		insert_posting(&pool, "old", "active", Some(at(15, 9))).await;
		insert_posting(&pool, "older", "active", Some(at(10, 9))).await;
		insert_posting(&pool, "done", POSTING_STATUS_EXPIRED, Some(at(12, 9))).await;
		insert_posting(&pool, "today", "active", Some(at(18, 1))).await;
		insert_posting(&pool, "open", "active", None).await;
		let repo = PostingRepository::new(pool);

		let start_of_today = DayRange::in_tz(&Utc, today(), 1).start;
		let expired = repo.find_expired(start_of_today).await.unwrap();

		let ids: Vec<_> = expired.iter().map(|p| p.id.as_str()).collect();
		assert_eq!(ids, vec!["old", "older"]);
		assert_eq!(expired[0].company_name, "Company old");
		assert_eq!(expired[0].ends_at, Some(at(15, 9)));
	}

	#[tokio::test]
	async fn test_find_expiring_covers_today_through_horizon() {
		let pool = create_test_pool().await;
		insert_posting(&pool, "yesterday", "active", Some(at(17, 23))).await;
		insert_posting(&pool, "today", "active", Some(at(18, 0))).await;
		insert_posting(&pool, "in-three", "active", Some(at(21, 23))).await;
		insert_posting(&pool, "in-one", "active", Some(at(19, 12))).await;
		insert_posting(&pool, "in-four", "active", Some(at(22, 0))).await;
		insert_posting(&pool, "done", POSTING_STATUS_EXPIRED, Some(at(19, 0))).await;
		let repo = PostingRepository::new(pool);

		let window = DayRange::in_tz(&Utc, today(), 4);
		let expiring = repo.find_expiring(window).await.unwrap();

		let ids: Vec<_> = expiring.iter().map(|p| p.id.as_str()).collect();
		assert_eq!(ids, vec!["today", "in-one", "in-three"]);
	}

	#[tokio::test]
	async fn test_mark_expired_only_changes_once() {
		let pool = create_test_pool().await;
		insert_posting(&pool, "old", "active", Some(at(15, 9))).await;
		let repo = PostingRepository::new(pool);

		assert!(repo.mark_expired("old").await.unwrap());
		assert!(!repo.mark_expired("old").await.unwrap());
		assert!(!repo.mark_expired("missing").await.unwrap());

		let start_of_today = DayRange::in_tz(&Utc, today(), 1).start;
		assert!(repo.find_expired(start_of_today).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_empty_table_yields_empty_results() {
		let repo = PostingRepository::new(create_test_pool().await);
		let window = DayRange::in_tz(&Utc, today(), 4);
		assert!(repo.find_expiring(window).await.unwrap().is_empty());
		assert!(repo.find_expired(window.start).await.unwrap().is_empty());
	}
}
