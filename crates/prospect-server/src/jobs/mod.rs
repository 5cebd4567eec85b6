// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Daily jobs that turn stored dates into events.

pub mod expiration_check;
pub mod reminder_check;

pub use expiration_check::{ExpirationCheckJob, EXPIRATION_CHECK_JOB_ID};
pub use reminder_check::{ReminderCheckJob, REMINDER_CHECK_JOB_ID};
