// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::cadence::Cadence;
use crate::context::{CancellationToken, JobContext};
use crate::error::{JobError, Result};
use crate::health::{aggregate, determine_health_state, JobHealthStatus, JobsHealthStatus, LastRunInfo, RunLedger};
use crate::job::Job;
use crate::types::{JobOutput, JobStatus, SchedulerState, TriggerSource};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct JobScheduler {
	jobs: Vec<Arc<dyn Job>>,
	cadence: Cadence,
	stop_timeout: Duration,
	state: Mutex<SchedulerState>,
	shutdown: CancellationToken,
	handles: Mutex<Vec<JoinHandle<()>>>,
	ledger: Arc<RunLedger>,
}

impl JobScheduler {
	pub fn new() -> Self {
		Self {
			jobs: Vec::new(),
			cadence: Cadence::daily_at_midnight(),
			stop_timeout: DEFAULT_STOP_TIMEOUT,
			state: Mutex::new(SchedulerState::Created),
			shutdown: CancellationToken::new(),
			handles: Mutex::new(Vec::new()),
			ledger: Arc::new(RunLedger::default()),
		}
	}

	pub fn with_cadence(mut self, cadence: Cadence) -> Self {
		self.cadence = cadence;
		self
	}

	pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
		self.stop_timeout = stop_timeout;
		self
	}

	/// Register a job. Only allowed before `start`; ids must be unique.
	pub fn add_job(&mut self, job: Arc<dyn Job>) -> Result<()> {
		let state = self.state();
		if state != SchedulerState::Created {
			return Err(JobError::InvalidState(format!(
				"cannot add job {} to a scheduler in state {state:?}",
				job.id()
			)));
		}
		if self.jobs.iter().any(|j| j.id() == job.id()) {
			return Err(JobError::InvalidState(format!(
				"job {} is already registered",
				job.id()
			)));
		}

		debug!(job_id = %job.id(), "Job registered");
		self.jobs.push(job);
		Ok(())
	}

	pub fn state(&self) -> SchedulerState {
		*lock(&self.state)
	}

	/// Spawn one loop per registered job. Must be called from within a Tokio
	/// runtime. Calls after the first (or after `stop`) do nothing.
	#[instrument(skip(self))]
	pub fn start(&self) {
		{
			let mut state = lock(&self.state);
			if *state != SchedulerState::Created {
				debug!(state = ?*state, "Scheduler already started or stopped; ignoring start");
				return;
			}
			*state = SchedulerState::Running;
		}

		let mut handles = lock(&self.handles);
		for job in &self.jobs {
			let handle = tokio::spawn(job_loop(
				Arc::clone(job),
				self.cadence.clone(),
				self.shutdown.clone(),
				Arc::clone(&self.ledger),
			));
			handles.push(handle);
		}

		info!(
			job_count = handles.len(),
			period_secs = self.cadence.period().as_secs(),
			"Job scheduler started"
		);
	}

	/// Signal every loop to stop and wait for them, bounded by the stop
	/// timeout. Loops still running when the timeout elapses are left to
	/// finish on their own. Safe to call more than once.
	#[instrument(skip(self))]
	pub async fn stop(&self) {
		{
			let mut state = lock(&self.state);
			if *state == SchedulerState::Stopped {
				debug!("Scheduler already stopped");
				return;
			}
			*state = SchedulerState::Stopped;
		}

		self.shutdown.cancel();

		let handles: Vec<_> = std::mem::take(&mut *lock(&self.handles));
		let loop_count = handles.len();

		match tokio::time::timeout(self.stop_timeout, futures::future::join_all(handles)).await {
			Ok(results) => {
				for result in results {
					if let Err(e) = result {
						warn!(error = %e, "Job loop ended abnormally");
					}
				}
				info!(loop_count, "Job scheduler stopped");
			}
			Err(_) => {
				warn!(
					loop_count,
					timeout_secs = self.stop_timeout.as_secs_f64(),
					"Timed out waiting for job loops to finish; abandoning them"
				);
			}
		}
	}

	/// Run one job now, outside its cadence. Failures are recorded in the
	/// health ledger and returned.
	#[instrument(skip(self))]
	pub async fn run_now(&self, job_id: &str) -> Result<JobOutput> {
		if self.state() == SchedulerState::Stopped {
			return Err(JobError::InvalidState("scheduler is stopped".to_string()));
		}

		let job = self
			.jobs
			.iter()
			.find(|j| j.id() == job_id)
			.ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

		execute_job(job, TriggerSource::Manual, &self.shutdown, &self.ledger).await
	}

	pub fn job_ids(&self) -> Vec<String> {
		self.jobs.iter().map(|j| j.id().to_string()).collect()
	}

	pub fn job_status(&self, job_id: &str) -> Option<JobHealthStatus> {
		let job = self.jobs.iter().find(|j| j.id() == job_id)?;
		let (last_run, consecutive_failures) = self.ledger.snapshot(job_id);
		let status = determine_health_state(last_run.as_ref(), consecutive_failures);

		Some(JobHealthStatus {
			job_id: job_id.to_string(),
			name: job.name().to_string(),
			status,
			last_run,
			consecutive_failures,
		})
	}

	pub fn health_status(&self) -> JobsHealthStatus {
		let jobs: Vec<_> = self
			.jobs
			.iter()
			.filter_map(|j| self.job_status(j.id()))
			.collect();

		JobsHealthStatus {
			status: aggregate(&jobs),
			jobs,
		}
	}
}

impl Default for JobScheduler {
	fn default() -> Self {
		Self::new()
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn job_loop(
	job: Arc<dyn Job>,
	cadence: Cadence,
	shutdown: CancellationToken,
	ledger: Arc<RunLedger>,
) {
	if shutdown.is_cancelled() {
		debug!(job_id = %job.id(), "Scheduler stopped before first run");
		return;
	}

	let _ = execute_job(&job, TriggerSource::Startup, &shutdown, &ledger).await;

	let first_delay = cadence.first_delay();
	debug!(
		job_id = %job.id(),
		delay_secs = first_delay.as_secs(),
		"Waiting for first scheduled run"
	);
	tokio::select! {
		biased;
		_ = shutdown.cancelled() => {
			info!(job_id = %job.id(), "Shutting down job loop");
			return;
		}
		_ = tokio::time::sleep(first_delay) => {}
	}

	let _ = execute_job(&job, TriggerSource::Schedule, &shutdown, &ledger).await;

	let period = cadence.period();
	let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			biased;
			_ = shutdown.cancelled() => {
				info!(job_id = %job.id(), "Shutting down job loop");
				break;
			}
			_ = ticker.tick() => {
				let _ = execute_job(&job, TriggerSource::Schedule, &shutdown, &ledger).await;
			}
		}
	}
}

#[instrument(skip(job, shutdown, ledger), fields(job_id = %job.id()))]
async fn execute_job(
	job: &Arc<dyn Job>,
	triggered_by: TriggerSource,
	shutdown: &CancellationToken,
	ledger: &RunLedger,
) -> Result<JobOutput> {
	let run_id = uuid::Uuid::new_v4().to_string();
	let ctx = JobContext {
		run_id: run_id.clone(),
		triggered_by,
		cancellation_token: shutdown.clone(),
	};
	let started_at = Utc::now();
	let started = Instant::now();

	let result = match AssertUnwindSafe(job.run(&ctx)).catch_unwind().await {
		Ok(result) => result,
		Err(panic) => {
			let message = format!("job panicked: {}", panic_message(panic.as_ref()));
			error!(run_id = %run_id, error = %message, "Job panicked");
			Err(JobError::Failed {
				message,
				retryable: false,
			})
		}
	};

	let duration_ms = i64::try_from(started.elapsed().as_millis()).ok();
	let (status, error) = match &result {
		Ok(output) => {
			info!(
				run_id = %run_id,
				triggered_by = %triggered_by,
				duration_ms,
				message = %output.message,
				"Job completed successfully"
			);
			(JobStatus::Succeeded, None)
		}
		Err(JobError::Cancelled) => {
			info!(run_id = %run_id, "Job cancelled");
			(JobStatus::Cancelled, None)
		}
		Err(e) => {
			warn!(run_id = %run_id, triggered_by = %triggered_by, error = %e, "Job failed");
			(JobStatus::Failed, Some(e.to_string()))
		}
	};

	ledger.record(
		job.id(),
		LastRunInfo {
			run_id,
			status,
			triggered_by,
			started_at,
			duration_ms,
			error,
		},
	);

	result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(s) = panic.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic payload".to_string()
	}
}
