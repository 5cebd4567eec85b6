// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Data access for the Prospect background worker.
//!
//! Postings, triggers, steps and actions are owned by the main application.
//! This crate only reads them, with one exception: a posting that has passed
//! its end date can be marked `expired`.

pub mod error;
pub mod pool;
pub mod posting;
pub mod schema;
pub mod step;
pub mod trigger;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{DbError, Result};
pub use pool::create_pool;
pub use posting::{PostingRepository, PostingStore};
pub use schema::apply_schema;
pub use step::{StepRepository, StepStore};
pub use trigger::{TriggerRepository, TriggerStore};
pub use types::{
	ActionDefinition, CallReminderTriggerConfig, DayRange, JobPosting, ProcessStep,
	ReminderTriggerConfig, TriggerConfig, TriggerDefinition, POSTING_STATUS_EXPIRED,
};
