// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring of jobs and listeners from configuration.

use prospect_server_actions::ActionExecutor;
use prospect_server_config::{JobsConfig, SchedulerConfig};
use prospect_server_db::{PostingStore, StepStore, TriggerStore};
use prospect_server_events::{EventBus, EventType};
use prospect_server_jobs::{Cadence, JobError, JobScheduler};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::jobs::{ExpirationCheckJob, ReminderCheckJob};
use crate::listeners::{JobPostingListener, ReminderListener};

/// Scheduler running every job at startup, at the next local midnight and
/// then once per configured period.
pub fn build_scheduler(config: &SchedulerConfig) -> JobScheduler {
	JobScheduler::new()
		.with_cadence(Cadence::daily_at_midnight().with_period(config.period()))
		.with_stop_timeout(config.stop_timeout())
}

/// Register the enabled daily jobs. Must run before the scheduler starts.
pub fn register_jobs(
	scheduler: &mut JobScheduler,
	config: &JobsConfig,
	bus: &EventBus,
	postings: Arc<dyn PostingStore>,
	triggers: Arc<dyn TriggerStore>,
) -> Result<(), JobError> {
	if config.expiration_check_enabled {
		scheduler.add_job(Arc::new(ExpirationCheckJob::new(
			postings,
			bus.clone(),
			config.expiring_horizon_days,
		)))?;
	}

	if config.reminder_check_enabled {
		scheduler.add_job(Arc::new(ReminderCheckJob::new(
			triggers,
			bus.clone(),
			config.reminder_trigger_code.clone(),
		)))?;
	}

	info!(jobs = ?scheduler.job_ids(), "Registered background jobs");
	Ok(())
}

/// Subscribe the reminder pipeline and the job-posting listener.
pub fn start_listeners(
	bus: &EventBus,
	steps: Arc<dyn StepStore>,
	postings: Arc<dyn PostingStore>,
	executor: ActionExecutor,
	listener_timeout: Duration,
) {
	bus.subscribe(
		EventType::ReminderTrigger,
		Arc::new(ReminderListener::new(steps, executor, listener_timeout)),
	);

	let postings_listener = Arc::new(JobPostingListener::new(postings));
	bus.subscribe(EventType::JobPostingExpiringSoon, postings_listener.clone());
	bus.subscribe(EventType::JobPostingExpired, postings_listener);
}
