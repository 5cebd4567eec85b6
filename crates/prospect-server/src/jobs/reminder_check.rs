// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Publishes one reminder event per trigger scheduled for today.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use prospect_server_db::{DayRange, TriggerStore};
use prospect_server_events::{Event, EventBus, ReminderFired};
use prospect_server_jobs::{Job, JobContext, JobError, JobOutput};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const REMINDER_CHECK_JOB_ID: &str = "reminder-check";

pub struct ReminderCheckJob {
	triggers: Arc<dyn TriggerStore>,
	bus: EventBus,
	trigger_code: String,
}

impl ReminderCheckJob {
	pub fn new(triggers: Arc<dyn TriggerStore>, bus: EventBus, trigger_code: impl Into<String>) -> Self {
		Self {
			triggers,
			bus,
			trigger_code: trigger_code.into(),
		}
	}

	/// Publish reminders for triggers whose `execute_at` falls on `today`
	/// in the host's time zone and which carry no `execute_when` gate.
	pub async fn check(&self, today: NaiveDate, ctx: &JobContext) -> Result<JobOutput, JobError> {
		if ctx.cancellation_token.is_cancelled() {
			return Err(JobError::Cancelled);
		}

		let triggers = self
			.triggers
			.find_scheduled(&self.trigger_code, DayRange::in_tz(&Local, today, 1))
			.await
			.map_err(|e| JobError::Failed {
				message: format!("Failed to query reminder triggers: {e}"),
				retryable: true,
			})?;

		if triggers.is_empty() {
			debug!(trigger_code = %self.trigger_code, date = %today, "No reminder triggers scheduled today");
		}

		let mut published = 0usize;
		for trigger in triggers {
			let Some(execute_at) = trigger.execute_at else {
				warn!(trigger_id = %trigger.id, "Reminder trigger has no execution time, skipping");
				continue;
			};

			self.bus.publish(Event::ReminderTrigger(ReminderFired {
				trigger_id: trigger.id,
				trigger_code: trigger.trigger_code,
				execute_at,
				config: trigger.config,
				step_id: trigger.step_id,
				created_by: trigger.created_by,
				order: trigger.order,
				expiration: trigger.expiration,
			}));
			published += 1;
		}

		info!(published, trigger_code = %self.trigger_code, "Reminder check completed");

		Ok(JobOutput {
			message: format!("Published {published} reminder events"),
			metadata: Some(serde_json::json!({
				"reminder_count": published,
				"trigger_code": self.trigger_code,
				"date": today.to_string(),
			})),
		})
	}
}

#[async_trait]
impl Job for ReminderCheckJob {
	fn id(&self) -> &str {
		REMINDER_CHECK_JOB_ID
	}

	fn name(&self) -> &str {
		"Reminder Trigger Check"
	}

	fn description(&self) -> &str {
		"Publish reminder events for triggers scheduled for today"
	}

	#[instrument(skip(self, ctx), fields(job_id = REMINDER_CHECK_JOB_ID, run_id = %ctx.run_id))]
	async fn run(&self, ctx: &JobContext) -> Result<JobOutput, JobError> {
		self.check(Local::now().date_naive(), ctx).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
	use prospect_server_db::testing::{FailingQuery, InMemoryStore};
	use prospect_server_db::TriggerDefinition;
	use prospect_server_events::EventType;
	use prospect_server_jobs::{CancellationToken, TriggerSource};
	use serde_json::json;
	use std::sync::Mutex;

	fn ctx() -> JobContext {
		JobContext {
			run_id: "run-1".to_string(),
			triggered_by: TriggerSource::Schedule,
			cancellation_token: CancellationToken::new(),
		}
	}

	fn today() -> NaiveDate {
		NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
	}

	fn local(date: NaiveDate, hour: u32) -> DateTime<Utc> {
		Local
			.from_local_datetime(&date.and_time(NaiveTime::from_hms_opt(hour, 30, 0).unwrap()))
			.earliest()
			.unwrap()
			.with_timezone(&Utc)
	}

	fn trigger(id: &str, code: &str, at: DateTime<Utc>) -> TriggerDefinition {
		TriggerDefinition {
			id: id.to_string(),
			order: 1,
			is_public: false,
			created_by: "recruiter-1".to_string(),
			trigger_code: code.to_string(),
			execute_when: None,
			execute_at: Some(at),
			combinator: None,
			config: json!({"type": "REMINDER", "label": "Call back"}),
			expiration: None,
			step_id: Some("step-1".to_string()),
		}
	}

	fn collect(bus: &EventBus) -> Arc<Mutex<Vec<ReminderFired>>> {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		bus.subscribe_fn(EventType::ReminderTrigger, "collect", move |event| {
			let sink = Arc::clone(&sink);
			async move {
				if let Event::ReminderTrigger(reminder) = &*event {
					sink.lock().unwrap().push(reminder.clone());
				}
			}
		});
		seen
	}

	#[tokio::test]
	async fn test_publishes_only_todays_ungated_triggers_of_the_code() {
		let tomorrow = today().checked_add_days(Days::new(1)).unwrap();
		let store = Arc::new(InMemoryStore::new());
		store.add_trigger(trigger("early", "REMINDER", local(today(), 0)));
		store.add_trigger(trigger("late", "REMINDER", local(today(), 23)));
		store.add_trigger(trigger("tomorrow", "REMINDER", local(tomorrow, 0)));
		store.add_trigger(trigger("other-code", "FOLLOW_UP", local(today(), 9)));
		let mut gated = trigger("gated", "REMINDER", local(today(), 9));
		gated.execute_when = Some("APPLICATION_RECEIVED".to_string());
		store.add_trigger(gated);

		let bus = EventBus::new(8);
		let seen = collect(&bus);
		let output = ReminderCheckJob::new(store, bus.clone(), "REMINDER")
			.check(today(), &ctx())
			.await
			.unwrap();
		bus.wait_idle().await;

		let mut ids: Vec<_> = seen.lock().unwrap().iter().map(|r| r.trigger_id.clone()).collect();
		ids.sort();
		assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);
		assert_eq!(output.metadata.unwrap()["reminder_count"], 2);
	}

	#[tokio::test]
	async fn test_event_carries_trigger_fields() {
		let store = Arc::new(InMemoryStore::new());
		let at = local(today(), 9);
		store.add_trigger(trigger("trg-1", "REMINDER", at));

		let bus = EventBus::new(8);
		let seen = collect(&bus);
		ReminderCheckJob::new(store, bus.clone(), "REMINDER")
			.check(today(), &ctx())
			.await
			.unwrap();
		bus.wait_idle().await;

		let seen = seen.lock().unwrap();
		assert_eq!(seen.len(), 1);
		let reminder = &seen[0];
		assert_eq!(reminder.trigger_code, "REMINDER");
		assert_eq!(reminder.execute_at, at);
		assert_eq!(reminder.step_id.as_deref(), Some("step-1"));
		assert_eq!(reminder.created_by, "recruiter-1");
		assert_eq!(reminder.config["label"], "Call back");
	}

	#[tokio::test]
	async fn test_zero_matches_is_success() {
		let bus = EventBus::new(8);
		let seen = collect(&bus);
		let output = ReminderCheckJob::new(Arc::new(InMemoryStore::new()), bus.clone(), "REMINDER")
			.check(today(), &ctx())
			.await
			.unwrap();
		bus.wait_idle().await;

		assert!(seen.lock().unwrap().is_empty());
		assert_eq!(output.metadata.unwrap()["reminder_count"], 0);
	}

	#[tokio::test]
	async fn test_query_failure_is_retryable_job_failure() {
		let store = Arc::new(InMemoryStore::new());
		store.fail(FailingQuery::FindScheduled);
		let err = ReminderCheckJob::new(store, EventBus::new(8), "REMINDER")
			.check(today(), &ctx())
			.await
			.unwrap_err();
		assert!(matches!(err, JobError::Failed { retryable: true, .. }));
	}
}
