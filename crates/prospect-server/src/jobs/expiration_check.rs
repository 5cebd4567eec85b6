// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Publishes an event for every job posting that has expired or is about to.
//!
//! The two lookups are independent: a failing expired query does not stop the
//! expiring-soon query from running, and the job only reports failure once
//! both have been attempted.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use prospect_server_db::{DayRange, JobPosting, PostingStore};
use prospect_server_events::{Event, EventBus, PostingExpiryNotice};
use prospect_server_jobs::{Job, JobContext, JobError, JobOutput};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const EXPIRATION_CHECK_JOB_ID: &str = "expiration-check";

pub struct ExpirationCheckJob {
	postings: Arc<dyn PostingStore>,
	bus: EventBus,
	horizon_days: u32,
}

impl ExpirationCheckJob {
	pub fn new(postings: Arc<dyn PostingStore>, bus: EventBus, horizon_days: u32) -> Self {
		Self {
			postings,
			bus,
			horizon_days,
		}
	}

	/// Run both checks as of the given local calendar date.
	pub async fn check(&self, today: NaiveDate, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let mut failures = Vec::new();

		let start_of_today = DayRange::in_tz(&Local, today, 1).start;
		let expired = match self.postings.find_expired(start_of_today).await {
			Ok(postings) => self.publish_all(postings, Event::JobPostingExpired),
			Err(e) => {
				warn!(error = %e, "Failed to query expired job postings");
				failures.push(format!("expired query: {e}"));
				0
			}
		};

		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		// Today through today + horizon, inclusive.
		let window = DayRange::in_tz(&Local, today, u64::from(self.horizon_days) + 1);
		let expiring = match self.postings.find_expiring(window).await {
			Ok(postings) => self.publish_all(postings, Event::JobPostingExpiringSoon),
			Err(e) => {
				warn!(error = %e, "Failed to query expiring job postings");
				failures.push(format!("expiring query: {e}"));
				0
			}
		};

		if !failures.is_empty() {
			return Err(JobError::Failed {
				message: format!(
					"Expiration check incomplete ({} expired and {} expiring published): {}",
					expired,
					expiring,
					failures.join("; ")
				),
				retryable: true,
			});
		}

		info!(expired, expiring, horizon_days = self.horizon_days, "Expiration check completed");

		Ok(JobOutput {
			message: format!("Published {expired} expired and {expiring} expiring-soon events"),
			metadata: Some(serde_json::json!({
				"expired_count": expired,
				"expiring_count": expiring,
				"horizon_days": self.horizon_days,
				"date": today.to_string(),
			})),
		})
	}

	fn publish_all(
		&self,
		postings: Vec<JobPosting>,
		wrap: fn(PostingExpiryNotice) -> Event,
	) -> usize {
		let mut published = 0;
		for posting in postings {
			let Some(ends_at) = posting.ends_at else {
				warn!(job_id = %posting.id, "Job posting has no end date, skipping");
				continue;
			};
			self.bus.publish(wrap(PostingExpiryNotice {
				job_id: posting.id,
				title: posting.title,
				company_name: posting.company_name,
				ends_at,
				url: posting.url,
			}));
			published += 1;
		}
		published
	}
}

#[async_trait]
impl Job for ExpirationCheckJob {
	fn id(&self) -> &str {
		EXPIRATION_CHECK_JOB_ID
	}

	fn name(&self) -> &str {
		"Job Posting Expiration Check"
	}

	fn description(&self) -> &str {
		"Publish events for job postings that have expired or expire within the horizon"
	}

	#[instrument(skip(self, ctx), fields(job_id = EXPIRATION_CHECK_JOB_ID, run_id = %ctx.run_id))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		self.check(Local::now().date_naive(), ctx).await
	}
}
