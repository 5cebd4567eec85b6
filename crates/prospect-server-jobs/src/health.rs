// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::{JobStatus, TriggerSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Serialize)]
pub struct JobHealthStatus {
	pub job_id: String,
	pub name: String,
	pub status: HealthState,
	pub last_run: Option<LastRunInfo>,
	pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastRunInfo {
	pub run_id: String,
	pub status: JobStatus,
	pub triggered_by: TriggerSource,
	pub started_at: DateTime<Utc>,
	pub duration_ms: Option<i64>,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Degraded,
	Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsHealthStatus {
	pub status: HealthState,
	pub jobs: Vec<JobHealthStatus>,
}

#[derive(Debug, Clone, Default)]
struct JobRecord {
	last_run: Option<LastRunInfo>,
	consecutive_failures: u32,
}

/// Process-local run history. Lost on restart.
#[derive(Debug, Default)]
pub(crate) struct RunLedger {
	records: Mutex<HashMap<String, JobRecord>>,
}

impl RunLedger {
	pub(crate) fn record(&self, job_id: &str, run: LastRunInfo) {
		let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
		let record = records.entry(job_id.to_string()).or_default();
		match run.status {
			JobStatus::Failed => record.consecutive_failures += 1,
			JobStatus::Succeeded => record.consecutive_failures = 0,
			JobStatus::Running | JobStatus::Cancelled => {}
		}
		record.last_run = Some(run);
	}

	pub(crate) fn snapshot(&self, job_id: &str) -> (Option<LastRunInfo>, u32) {
		let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
		records
			.get(job_id)
			.map(|r| (r.last_run.clone(), r.consecutive_failures))
			.unwrap_or((None, 0))
	}
}

pub(crate) fn determine_health_state(
	last_run: Option<&LastRunInfo>,
	consecutive_failures: u32,
) -> HealthState {
	match last_run {
		None => HealthState::Healthy,
		Some(run) => match run.status {
			JobStatus::Succeeded => HealthState::Healthy,
			JobStatus::Running => HealthState::Healthy,
			JobStatus::Cancelled => HealthState::Healthy,
			JobStatus::Failed => {
				if consecutive_failures >= 3 {
					HealthState::Unhealthy
				} else if consecutive_failures >= 1 {
					HealthState::Degraded
				} else {
					HealthState::Healthy
				}
			}
		},
	}
}

/// Worst state across all jobs.
pub(crate) fn aggregate(jobs: &[JobHealthStatus]) -> HealthState {
	let mut worst_state = HealthState::Healthy;
	for job in jobs {
		if job.status == HealthState::Unhealthy {
			worst_state = HealthState::Unhealthy;
		} else if job.status == HealthState::Degraded && worst_state != HealthState::Unhealthy {
			worst_state = HealthState::Degraded;
		}
	}
	worst_state
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(status: JobStatus) -> LastRunInfo {
		LastRunInfo {
			run_id: "run-1".to_string(),
			status,
			triggered_by: TriggerSource::Schedule,
			started_at: Utc::now(),
			duration_ms: Some(100),
			error: (status == JobStatus::Failed).then(|| "Error".to_string()),
		}
	}

	fn job(status: HealthState) -> JobHealthStatus {
		JobHealthStatus {
			job_id: "job".to_string(),
			name: "Job".to_string(),
			status,
			last_run: None,
			consecutive_failures: 0,
		}
	}

	#[test]
	fn test_determine_health_state_no_last_run() {
		assert_eq!(determine_health_state(None, 0), HealthState::Healthy);
	}

	#[test]
	fn test_determine_health_state_succeeded() {
		let run = run(JobStatus::Succeeded);
		assert_eq!(determine_health_state(Some(&run), 0), HealthState::Healthy);
	}

	#[test]
	fn test_determine_health_state_cancelled() {
		let run = run(JobStatus::Cancelled);
		assert_eq!(determine_health_state(Some(&run), 0), HealthState::Healthy);
	}

	#[test]
	fn test_determine_health_state_failed_one_consecutive() {
		let run = run(JobStatus::Failed);
		assert_eq!(determine_health_state(Some(&run), 1), HealthState::Degraded);
		assert_eq!(determine_health_state(Some(&run), 2), HealthState::Degraded);
	}

	#[test]
	fn test_determine_health_state_failed_three_plus_consecutive() {
		let run = run(JobStatus::Failed);
		assert_eq!(determine_health_state(Some(&run), 3), HealthState::Unhealthy);
		assert_eq!(determine_health_state(Some(&run), 5), HealthState::Unhealthy);
	}

	#[test]
	fn test_ledger_counts_consecutive_failures_until_success() {
		let ledger = RunLedger::default();
		ledger.record("job-1", run(JobStatus::Failed));
		ledger.record("job-1", run(JobStatus::Failed));
		assert_eq!(ledger.snapshot("job-1").1, 2);

		ledger.record("job-1", run(JobStatus::Succeeded));
		let (last_run, failures) = ledger.snapshot("job-1");
		assert_eq!(failures, 0);
		assert_eq!(last_run.unwrap().status, JobStatus::Succeeded);
	}

	#[test]
	fn test_ledger_unknown_job_has_no_history() {
		let ledger = RunLedger::default();
		let (last_run, failures) = ledger.snapshot("missing");
		assert!(last_run.is_none());
		assert_eq!(failures, 0);
	}

	#[test]
	fn test_aggregate_takes_worst_state() {
		assert_eq!(aggregate(&[]), HealthState::Healthy);
		assert_eq!(
			aggregate(&[job(HealthState::Healthy), job(HealthState::Degraded)]),
			HealthState::Degraded
		);
		assert_eq!(
			aggregate(&[
				job(HealthState::Unhealthy),
				job(HealthState::Degraded),
				job(HealthState::Healthy)
			]),
			HealthState::Unhealthy
		);
	}
}
