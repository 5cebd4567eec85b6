// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turns a fired reminder into the ordered actions of its step.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use prospect_server_actions::{ActionExecutor, ExecutionReport};
use prospect_server_db::{StepStore, TriggerConfig};
use prospect_server_events::{Event, Listener, ReminderFired};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::ledger::FiredTriggerLedger;

/// What a reminder delivery led to.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderOutcome {
	/// The trigger's expiration has passed.
	Expired,
	/// No step is attached; nothing to run.
	NoStep,
	/// Already handled for this scheduled date in this process.
	Duplicate,
	StepNotFound,
	LookupFailed(String),
	Executed(ExecutionReport),
}

pub struct ReminderListener {
	steps: Arc<dyn StepStore>,
	executor: ActionExecutor,
	ledger: Arc<FiredTriggerLedger>,
	timeout: Duration,
}

impl ReminderListener {
	pub fn new(steps: Arc<dyn StepStore>, executor: ActionExecutor, timeout: Duration) -> Self {
		Self {
			steps,
			executor,
			ledger: Arc::new(FiredTriggerLedger::new()),
			timeout,
		}
	}

	/// Share a ledger between listeners (or inspect it from tests).
	pub fn with_ledger(mut self, ledger: Arc<FiredTriggerLedger>) -> Self {
		self.ledger = ledger;
		self
	}

	#[instrument(
		skip(self, reminder, now),
		fields(trigger_id = %reminder.trigger_id, step_id = ?reminder.step_id)
	)]
	pub async fn process(&self, reminder: &ReminderFired, now: DateTime<Utc>) -> ReminderOutcome {
		if reminder.expiration.is_some_and(|expiration| expiration < now) {
			info!(expiration = ?reminder.expiration, "Reminder trigger expired, skipping");
			return ReminderOutcome::Expired;
		}

		match TriggerConfig::decode(&reminder.config) {
			Ok(TriggerConfig::Reminder(config)) => {
				debug!(label = ?config.label, "Reminder fired");
			}
			Ok(other) => debug!(config = ?other, "Reminder fired with non-reminder config"),
			Err(e) => warn!(error = %e, "Reminder config does not match its type"),
		}

		let Some(step_id) = reminder.step_id.as_deref() else {
			info!("Reminder has no step, no actions to run");
			return ReminderOutcome::NoStep;
		};

		let scheduled_for = reminder.execute_at.with_timezone(&Local).date_naive();
		let Some(mark) = self.ledger.claim(&reminder.trigger_id, scheduled_for, now) else {
			warn!(scheduled_for = %scheduled_for, "Reminder already fired for this date, skipping");
			return ReminderOutcome::Duplicate;
		};

		// Until `keep`, a dropped future (listener timeout) or a failed lookup
		// releases the mark.
		let step = match self.steps.get_step_with_actions(step_id).await {
			Ok(Some(step)) => step,
			Ok(None) => {
				mark.keep();
				warn!("Step for reminder not found");
				return ReminderOutcome::StepNotFound;
			}
			Err(e) => {
				error!(error = %e, "Failed to load step for reminder");
				return ReminderOutcome::LookupFailed(e.to_string());
			}
		};
		mark.keep();

		let mut actions = step.actions;
		actions.sort_by_key(|action| action.order);

		let report = self.executor.execute_actions(&actions).await;
		if report.has_failures() {
			warn!(
				step_name = %step.name,
				executed = report.executed(),
				skipped = report.skipped(),
				failed = report.failed(),
				"Reminder actions finished with failures"
			);
		} else {
			info!(
				step_name = %step.name,
				executed = report.executed(),
				skipped = report.skipped(),
				"Reminder actions finished"
			);
		}
		ReminderOutcome::Executed(report)
	}
}

#[async_trait]
impl Listener for ReminderListener {
	fn name(&self) -> &str {
		"reminder-listener"
	}

	async fn handle(&self, event: Arc<Event>) {
		let Event::ReminderTrigger(reminder) = &*event else {
			warn!(event_type = %event.event_type(), "Reminder listener received unexpected event");
			return;
		};

		if tokio::time::timeout(self.timeout, self.process(reminder, Utc::now()))
			.await
			.is_err()
		{
			warn!(
				trigger_id = %reminder.trigger_id,
				timeout_secs = self.timeout.as_secs(),
				"Reminder processing timed out"
			);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration as ChronoDuration;
	use prospect_server_actions::testing::{Call, RecordingIntegrations};
	use prospect_server_actions::{ActionKind, ActionStatus, Integrations};
	use prospect_server_db::testing::{FailingQuery, InMemoryStore};
	use prospect_server_db::{ActionDefinition, ProcessStep};
	use serde_json::{json, Value};

	fn reminder(step_id: Option<&str>) -> ReminderFired {
		ReminderFired {
			trigger_id: "trg-1".to_string(),
			trigger_code: "REMINDER".to_string(),
			execute_at: Utc::now(),
			config: json!({"type": "REMINDER", "label": "Follow up"}),
			step_id: step_id.map(str::to_string),
			created_by: "recruiter-1".to_string(),
			order: 0,
			expiration: None,
		}
	}

	fn action(id: &str, order: i32, config: Value) -> ActionDefinition {
		ActionDefinition {
			id: id.to_string(),
			step_id: "step-1".to_string(),
			name: format!("Action {id}"),
			is_public: false,
			order,
			config,
		}
	}

	fn email(subject: &str) -> Value {
		json!({
			"type": "SEND_EMAIL",
			"to": "CUSTOM",
			"email": "candidate@example.com",
			"subject": subject,
			"content": "<p>Hello</p>"
		})
	}

	fn seeded_store() -> Arc<InMemoryStore> {
		let store = Arc::new(InMemoryStore::new());
		store.add_step(ProcessStep {
			id: "step-1".to_string(),
			process_id: Some("process-1".to_string()),
			name: "Phone screen".to_string(),
			status: "pending".to_string(),
			order: 1,
			actions: Vec::new(),
		});
		store.add_action(action("second", 2, email("second")));
		store.add_action(action("first", 1, email("first")));
		store.add_action(action("third", 3, json!({"type": "UPDATE_STEP_STATUS", "status": "completed"})));
		store
	}

	fn listener(store: Arc<InMemoryStore>, recorder: Arc<RecordingIntegrations>) -> ReminderListener {
		ReminderListener::new(
			store,
			ActionExecutor::new(Integrations::uniform(recorder)),
			Duration::from_secs(5),
		)
	}

	fn subjects(calls: &[Call]) -> Vec<String> {
		calls
			.iter()
			.filter_map(|call| match call {
				Call::Email(message) => Some(message.subject.clone()),
				_ => None,
			})
			.collect()
	}

	#[tokio::test]
	async fn test_runs_step_actions_in_order() {
		let recorder = Arc::new(RecordingIntegrations::new());
		let listener = listener(seeded_store(), recorder.clone());

		let outcome = listener.process(&reminder(Some("step-1")), Utc::now()).await;

		match outcome {
			ReminderOutcome::Executed(report) => assert_eq!(report.executed(), 3),
			other => panic!("unexpected outcome: {other:?}"),
		}
		let calls = recorder.calls();
		assert_eq!(subjects(&calls), vec!["first".to_string(), "second".to_string()]);
		assert_eq!(calls.last().unwrap().kind(), ActionKind::UpdateStepStatus);
	}

	#[tokio::test]
	async fn test_missing_step_id_fetches_nothing() {
		let store = seeded_store();
		let recorder = Arc::new(RecordingIntegrations::new());
		let listener = listener(store.clone(), recorder.clone());

		let outcome = listener.process(&reminder(None), Utc::now()).await;

		assert_eq!(outcome, ReminderOutcome::NoStep);
		assert_eq!(store.step_fetches(), 0);
		assert!(recorder.calls().is_empty());
	}

	#[tokio::test]
	async fn test_unknown_step_runs_nothing() {
		let recorder = Arc::new(RecordingIntegrations::new());
		let listener = listener(Arc::new(InMemoryStore::new()), recorder.clone());

		let outcome = listener.process(&reminder(Some("step-404")), Utc::now()).await;

		assert_eq!(outcome, ReminderOutcome::StepNotFound);
		assert!(recorder.calls().is_empty());
	}

	#[tokio::test]
	async fn test_expired_trigger_is_skipped() {
		let store = seeded_store();
		let recorder = Arc::new(RecordingIntegrations::new());
		let listener = listener(store.clone(), recorder.clone());
		let now = Utc::now();
		let mut expired = reminder(Some("step-1"));
		expired.expiration = Some(now - ChronoDuration::hours(1));

		assert_eq!(listener.process(&expired, now).await, ReminderOutcome::Expired);
		assert_eq!(store.step_fetches(), 0);
		assert!(recorder.calls().is_empty());
	}

	#[tokio::test]
	async fn test_duplicate_delivery_runs_actions_once() {
		let recorder = Arc::new(RecordingIntegrations::new());
		let listener = listener(seeded_store(), recorder.clone());
		let fired = reminder(Some("step-1"));

		assert!(matches!(
			listener.process(&fired, Utc::now()).await,
			ReminderOutcome::Executed(_)
		));
		assert_eq!(listener.process(&fired, Utc::now()).await, ReminderOutcome::Duplicate);
		assert_eq!(recorder.calls().len(), 3);
	}

	#[tokio::test]
	async fn test_lookup_failure_can_be_retried() {
		let store = seeded_store();
		store.fail(FailingQuery::GetStep);
		let ledger = Arc::new(FiredTriggerLedger::new());
		let listener = listener(store, Arc::new(RecordingIntegrations::new())).with_ledger(ledger.clone());

		let outcome = listener.process(&reminder(Some("step-1")), Utc::now()).await;

		assert!(matches!(outcome, ReminderOutcome::LookupFailed(_)));
		assert!(ledger.is_empty());
	}

	struct StalledSteps;

	#[async_trait]
	impl StepStore for StalledSteps {
		async fn get_step(&self, _id: &str) -> prospect_server_db::Result<Option<ProcessStep>> {
			tokio::time::sleep(Duration::from_secs(10)).await;
			Ok(None)
		}

		async fn list_actions(&self, _step_id: &str) -> prospect_server_db::Result<Vec<ActionDefinition>> {
			Ok(Vec::new())
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_timed_out_lookup_releases_the_date() {
		let ledger = Arc::new(FiredTriggerLedger::new());
		let stalled = ReminderListener::new(
			Arc::new(StalledSteps),
			ActionExecutor::new(Integrations::uniform(Arc::new(RecordingIntegrations::new()))),
			Duration::from_secs(1),
		)
		.with_ledger(ledger.clone());
		let fired = reminder(Some("step-1"));

		stalled.handle(Arc::new(Event::ReminderTrigger(fired.clone()))).await;
		assert!(ledger.is_empty());

		let recorder = Arc::new(RecordingIntegrations::new());
		let retry = listener(seeded_store(), recorder.clone()).with_ledger(ledger);
		assert!(matches!(
			retry.process(&fired, Utc::now()).await,
			ReminderOutcome::Executed(_)
		));
		assert_eq!(recorder.calls().len(), 3);
	}

	#[tokio::test]
	async fn test_failed_action_does_not_stop_the_rest() {
		let recorder = Arc::new(RecordingIntegrations::new());
		recorder.fail_on(ActionKind::UpdateStepStatus);
		let store = seeded_store();
		store.add_action(action("fourth", 4, email("fourth")));
		let listener = listener(store, recorder.clone());

		let outcome = listener.process(&reminder(Some("step-1")), Utc::now()).await;

		let ReminderOutcome::Executed(report) = outcome else {
			panic!("unexpected outcome: {outcome:?}");
		};
		assert_eq!(report.failed(), 1);
		assert!(matches!(report.actions[2].status, ActionStatus::Failed { .. }));
		assert_eq!(
			subjects(&recorder.calls()),
			vec!["first".to_string(), "second".to_string(), "fourth".to_string()]
		);
	}

	#[tokio::test]
	async fn test_handle_ignores_other_event_types() {
		let store = seeded_store();
		let recorder = Arc::new(RecordingIntegrations::new());
		let listener = listener(store.clone(), recorder.clone());

		listener
			.handle(Arc::new(Event::JobPostingExpired(
				prospect_server_events::PostingExpiryNotice {
					job_id: "job-1".to_string(),
					title: "Designer".to_string(),
					company_name: "Globex".to_string(),
					ends_at: Utc::now(),
					url: None,
				},
			)))
			.await;

		assert_eq!(store.step_fetches(), 0);
		assert!(recorder.calls().is_empty());
	}
}
