// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod job_posting;
pub mod ledger;
pub mod reminder;

pub use job_posting::JobPostingListener;
pub use ledger::{FiredMark, FiredTriggerLedger};
pub use reminder::{ReminderListener, ReminderOutcome};
