// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a partial `*ConfigLayer` and a resolved
//! `*Config`.

mod actions;
mod database;
mod events;
mod jobs;
mod logging;
mod scheduler;

pub use actions::{ActionsConfig, ActionsConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use events::{EventsConfig, EventsConfigLayer};
pub use jobs::{JobsConfig, JobsConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use scheduler::{SchedulerConfig, SchedulerConfigLayer};
