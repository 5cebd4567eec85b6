// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Executes the ordered actions attached to a process step.
//!
//! Each action's JSON config carries a `type` tag selecting one of a fixed
//! set of kinds. The executor validates the kind-specific fields and hands a
//! typed request to the matching integration. It decides that and in what
//! order side effects happen; the integrations perform them.

pub mod config;
pub mod error;
pub mod executor;
pub mod integrations;
pub mod webhook;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{decode_config, ActionConfig, ActionKind, DecodedConfig};
pub use error::{ActionError, IntegrationError};
pub use executor::{ActionExecutor, ActionOutcome, ActionReport, ActionStatus, ExecutionReport, SkipReason};
pub use integrations::{
	CalendarEvent, CalendarService, EmailMessage, EmailSender, Integrations, LoggingIntegrations,
	Recipient, ReminderRequest, ReminderScheduler, StepStatus, StepStatusUpdate, StepStatusUpdater,
	TaskRequest, TaskService, WebhookClient, WebhookRequest,
};
pub use webhook::HttpWebhookClient;
