// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Side-effect collaborators invoked by the executor, one per action kind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::error::IntegrationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recipient {
	Custom { email: String },
	ProcessOwner { step_id: String },
	Counterpart { step_id: Option<String> },
	AllCounterparts { step_id: Option<String> },
	System,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
	pub recipient: Recipient,
	pub subject: String,
	pub html: String,
	pub text: String,
	pub reply_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
	pub calendar_id: String,
	pub title: String,
	pub description: Option<String>,
	pub location: Option<String>,
	pub start: DateTime<Utc>,
	pub end: DateTime<Utc>,
	pub attendees: Vec<String>,
	pub color_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRequest {
	pub title: String,
	pub description: Option<String>,
	pub assignee: String,
	pub due: Option<DateTime<Utc>>,
	pub step_id: String,
}

/// A follow-up reminder trigger to be created for a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderRequest {
	pub step_id: String,
	pub execute_at: DateTime<Utc>,
	pub days_from_now: i64,
	pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookRequest {
	pub url: String,
	/// Upper-case HTTP method.
	pub method: String,
	pub headers: BTreeMap<String, String>,
	/// Present only for POST, PUT and PATCH.
	pub body: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
	Completed,
	Skipped,
	InProgress,
	Failed,
}

impl StepStatus {
	pub const ALL: [StepStatus; 4] = [
		StepStatus::Completed,
		StepStatus::Skipped,
		StepStatus::InProgress,
		StepStatus::Failed,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			StepStatus::Completed => "completed",
			StepStatus::Skipped => "skipped",
			StepStatus::InProgress => "in_progress",
			StepStatus::Failed => "failed",
		}
	}
}

impl fmt::Display for StepStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for StepStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		StepStatus::ALL
			.into_iter()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| format!("unknown step status: {s}"))
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepStatusUpdate {
	pub step_id: String,
	pub status: StepStatus,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
	async fn send_email(&self, message: EmailMessage) -> Result<(), IntegrationError>;
}

#[async_trait]
pub trait CalendarService: Send + Sync {
	async fn create_event(&self, event: CalendarEvent) -> Result<(), IntegrationError>;
}

#[async_trait]
pub trait TaskService: Send + Sync {
	async fn create_task(&self, task: TaskRequest) -> Result<(), IntegrationError>;
}

#[async_trait]
pub trait ReminderScheduler: Send + Sync {
	async fn schedule_reminder(&self, reminder: ReminderRequest) -> Result<(), IntegrationError>;
}

#[async_trait]
pub trait WebhookClient: Send + Sync {
	async fn send(&self, request: WebhookRequest) -> Result<(), IntegrationError>;
}

#[async_trait]
pub trait StepStatusUpdater: Send + Sync {
	async fn update_status(&self, update: StepStatusUpdate) -> Result<(), IntegrationError>;
}

/// The collaborator for each action kind.
#[derive(Clone)]
pub struct Integrations {
	pub email: Arc<dyn EmailSender>,
	pub calendar: Arc<dyn CalendarService>,
	pub tasks: Arc<dyn TaskService>,
	pub reminders: Arc<dyn ReminderScheduler>,
	pub webhooks: Arc<dyn WebhookClient>,
	pub step_status: Arc<dyn StepStatusUpdater>,
}

impl Integrations {
	/// Every kind backed by one value implementing all six traits.
	pub fn uniform<T>(all: Arc<T>) -> Self
	where
		T: EmailSender
			+ CalendarService
			+ TaskService
			+ ReminderScheduler
			+ WebhookClient
			+ StepStatusUpdater
			+ 'static,
	{
		Self {
			email: all.clone(),
			calendar: all.clone(),
			tasks: all.clone(),
			reminders: all.clone(),
			webhooks: all.clone(),
			step_status: all,
		}
	}

	/// Every kind only logs what it would do.
	pub fn logging() -> Self {
		Self::uniform(Arc::new(LoggingIntegrations))
	}

	pub fn with_webhooks(mut self, webhooks: Arc<dyn WebhookClient>) -> Self {
		self.webhooks = webhooks;
		self
	}
}

/// Logs each request and reports success. Used for kinds with no real
/// backend configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingIntegrations;

#[async_trait]
impl EmailSender for LoggingIntegrations {
	async fn send_email(&self, message: EmailMessage) -> Result<(), IntegrationError> {
		info!(recipient = ?message.recipient, subject = %message.subject, "email not sent: no email backend");
		Ok(())
	}
}

#[async_trait]
impl CalendarService for LoggingIntegrations {
	async fn create_event(&self, event: CalendarEvent) -> Result<(), IntegrationError> {
		info!(
			calendar_id = %event.calendar_id,
			title = %event.title,
			start = %event.start,
			end = %event.end,
			attendees = event.attendees.len(),
			"calendar event not created: no calendar backend"
		);
		Ok(())
	}
}

#[async_trait]
impl TaskService for LoggingIntegrations {
	async fn create_task(&self, task: TaskRequest) -> Result<(), IntegrationError> {
		info!(title = %task.title, assignee = %task.assignee, due = ?task.due, "task not created: no task backend");
		Ok(())
	}
}

#[async_trait]
impl ReminderScheduler for LoggingIntegrations {
	async fn schedule_reminder(&self, reminder: ReminderRequest) -> Result<(), IntegrationError> {
		info!(
			step_id = %reminder.step_id,
			execute_at = %reminder.execute_at,
			"call reminder not stored: no reminder backend"
		);
		Ok(())
	}
}

#[async_trait]
impl WebhookClient for LoggingIntegrations {
	async fn send(&self, request: WebhookRequest) -> Result<(), IntegrationError> {
		info!(url = %request.url, method = %request.method, "webhook not sent: no http client");
		Ok(())
	}
}

#[async_trait]
impl StepStatusUpdater for LoggingIntegrations {
	async fn update_status(&self, update: StepStatusUpdate) -> Result<(), IntegrationError> {
		info!(step_id = %update.step_id, status = %update.status, "step status not updated: no step backend");
		Ok(())
	}
}
