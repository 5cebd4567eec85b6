// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Prospect background worker.
//!
//! Daily jobs look for expiring job postings and due reminder triggers and
//! publish events. Listeners react: expired postings are marked, and a
//! reminder runs the ordered actions of its workflow step.

pub mod jobs;
pub mod listeners;
pub mod setup;

pub use jobs::{ExpirationCheckJob, ReminderCheckJob, EXPIRATION_CHECK_JOB_ID, REMINDER_CHECK_JOB_ID};
pub use listeners::{FiredTriggerLedger, JobPostingListener, ReminderListener, ReminderOutcome};
pub use setup::{build_scheduler, register_jobs, start_listeners};
