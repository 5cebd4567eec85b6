// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job scheduler for the Prospect worker.
//!
//! Jobs are registered once before the scheduler starts. Each job gets its own
//! loop: one run at startup, one at the next local midnight, then one every
//! 24 hours until the scheduler is stopped. Run history is kept in memory for
//! health reporting only.

pub mod cadence;
pub mod context;
pub mod error;
pub mod health;
pub mod job;
pub mod scheduler;
pub mod types;

pub use cadence::{duration_until_next_midnight, until_next_local_midnight, Cadence, DAILY};
pub use context::{CancellationToken, JobContext};
pub use error::{JobError, Result};
pub use health::{HealthState, JobHealthStatus, JobsHealthStatus, LastRunInfo};
pub use job::Job;
pub use scheduler::{JobScheduler, DEFAULT_STOP_TIMEOUT};
pub use types::{JobOutput, JobStatus, SchedulerState, TriggerSource};
