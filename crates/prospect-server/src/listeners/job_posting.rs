// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use prospect_server_db::PostingStore;
use prospect_server_events::{Event, Listener};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Logs postings that are about to expire and marks expired ones so later
/// checks stop reporting them.
pub struct JobPostingListener {
	postings: Arc<dyn PostingStore>,
}

impl JobPostingListener {
	pub fn new(postings: Arc<dyn PostingStore>) -> Self {
		Self { postings }
	}
}

#[async_trait]
impl Listener for JobPostingListener {
	fn name(&self) -> &str {
		"job-posting-listener"
	}

	#[instrument(skip(self, event), fields(event_type = %event.event_type()))]
	async fn handle(&self, event: Arc<Event>) {
		match &*event {
			Event::JobPostingExpiringSoon(notice) => {
				info!(
					job_id = %notice.job_id,
					title = %notice.title,
					company = %notice.company_name,
					ends_at = %notice.ends_at,
					"Job posting expires soon"
				);
			}
			Event::JobPostingExpired(notice) => match self.postings.mark_expired(&notice.job_id).await {
				Ok(true) => info!(job_id = %notice.job_id, title = %notice.title, "Job posting marked expired"),
				Ok(false) => debug!(job_id = %notice.job_id, "Job posting already expired or missing"),
				Err(e) => warn!(job_id = %notice.job_id, error = %e, "Failed to mark job posting expired"),
			},
			other => debug!(event_type = %other.event_type(), "Ignoring unrelated event"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use prospect_server_db::testing::{FailingQuery, InMemoryStore};
	use prospect_server_db::JobPosting;
	use prospect_server_events::PostingExpiryNotice;

	fn store_with(id: &str) -> Arc<InMemoryStore> {
		let store = Arc::new(InMemoryStore::new());
		store.add_posting(JobPosting {
			id: id.to_string(),
			title: "Backend Engineer".to_string(),
			company_name: "Acme".to_string(),
			url: None,
			status: "active".to_string(),
			ends_at: Some(Utc::now()),
		});
		store
	}

	fn notice(id: &str) -> PostingExpiryNotice {
		PostingExpiryNotice {
			job_id: id.to_string(),
			title: "Backend Engineer".to_string(),
			company_name: "Acme".to_string(),
			ends_at: Utc::now(),
			url: None,
		}
	}

	#[tokio::test]
	async fn test_expired_notice_marks_posting() {
		let store = store_with("job-1");
		let listener = JobPostingListener::new(store.clone());
		listener
			.handle(Arc::new(Event::JobPostingExpired(notice("job-1"))))
			.await;
		assert_eq!(store.posting("job-1").unwrap().status, "expired");
	}

	#[tokio::test]
	async fn test_expiring_notice_changes_nothing() {
		let store = store_with("job-1");
		let listener = JobPostingListener::new(store.clone());
		listener
			.handle(Arc::new(Event::JobPostingExpiringSoon(notice("job-1"))))
			.await;
		assert_eq!(store.posting("job-1").unwrap().status, "active");
	}

	#[tokio::test]
	async fn test_store_failure_is_swallowed() {
		let store = store_with("job-1");
		store.fail(FailingQuery::MarkExpired);
		let listener = JobPostingListener::new(store.clone());
		listener
			.handle(Arc::new(Event::JobPostingExpired(notice("job-1"))))
			.await;
		assert_eq!(store.posting("job-1").unwrap().status, "active");
	}
}
