// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Duration, Utc};
use prospect_server_db::ActionDefinition;
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

use crate::config::{
	decode_config, ActionConfig, ActionKind, CalendarEventConfig, CallReminderConfig, CreateTaskConfig,
	DecodedConfig, SendEmailConfig, UpdateStepStatusConfig, WebhookConfig,
};
use crate::error::ActionError;
use crate::integrations::{
	CalendarEvent, EmailMessage, Integrations, Recipient, ReminderRequest, StepStatus, StepStatusUpdate,
	TaskRequest, WebhookRequest,
};

const DEFAULT_EVENT_MINUTES: f64 = 60.0;
const DEFAULT_CALENDAR: &str = "primary";
const DEFAULT_ASSIGNEE: &str = "PROCESS_OWNER";
const DEFAULT_WEBHOOK_METHOD: &str = "POST";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
	EmptyConfig,
	MissingKind,
	UnknownKind(String),
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SkipReason::EmptyConfig => f.write_str("config is empty"),
			SkipReason::MissingKind => f.write_str("config has no type"),
			SkipReason::UnknownKind(tag) => write!(f, "unknown action type {tag}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
	Executed(ActionKind),
	Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
	Executed { kind: ActionKind },
	Skipped { reason: SkipReason },
	Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
	pub action_id: String,
	pub action_name: String,
	pub status: ActionStatus,
}

/// Per-action outcomes of one `execute_actions` call, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
	pub actions: Vec<ActionReport>,
}

impl ExecutionReport {
	pub fn executed(&self) -> usize {
		self.count(|s| matches!(s, ActionStatus::Executed { .. }))
	}

	pub fn skipped(&self) -> usize {
		self.count(|s| matches!(s, ActionStatus::Skipped { .. }))
	}

	pub fn failed(&self) -> usize {
		self.count(|s| matches!(s, ActionStatus::Failed { .. }))
	}

	pub fn has_failures(&self) -> bool {
		self.failed() > 0
	}

	fn count(&self, pred: impl Fn(&ActionStatus) -> bool) -> usize {
		self.actions.iter().filter(|a| pred(&a.status)).count()
	}
}

/// Runs actions against the configured integrations.
#[derive(Clone)]
pub struct ActionExecutor {
	integrations: Integrations,
}

impl ActionExecutor {
	pub fn new(integrations: Integrations) -> Self {
		Self { integrations }
	}

	/// Run every action in the given order. A failing action is logged and
	/// recorded; the rest still run. Callers sort by `order` beforehand.
	#[instrument(skip(self, actions), fields(action_count = actions.len()))]
	pub async fn execute_actions(&self, actions: &[ActionDefinition]) -> ExecutionReport {
		let mut report = ExecutionReport::default();

		for action in actions {
			let status = match self.execute_action(action).await {
				Ok(ActionOutcome::Executed(kind)) => ActionStatus::Executed { kind },
				Ok(ActionOutcome::Skipped(reason)) => ActionStatus::Skipped { reason },
				Err(e) => {
					warn!(action_id = %action.id, error = %e, "action failed, continuing with next");
					ActionStatus::Failed { error: e.to_string() }
				}
			};
			report.actions.push(ActionReport {
				action_id: action.id.clone(),
				action_name: action.name.clone(),
				status,
			});
		}

		report
	}

	/// Run one action. Empty, untyped and unknown configs are skipped with a
	/// warning rather than treated as errors.
	#[instrument(skip(self, action), fields(action_id = %action.id, step_id = %action.step_id))]
	pub async fn execute_action(&self, action: &ActionDefinition) -> Result<ActionOutcome, ActionError> {
		let config = match decode_config(&action.config)? {
			DecodedConfig::Known(config) => config,
			DecodedConfig::Empty => return Ok(skip(SkipReason::EmptyConfig)),
			DecodedConfig::MissingKind => return Ok(skip(SkipReason::MissingKind)),
			DecodedConfig::Unknown(tag) => return Ok(skip(SkipReason::UnknownKind(tag))),
		};

		let kind = config.kind();
		info!(kind = %kind, "executing action");

		match config {
			ActionConfig::SendEmail(c) => self.send_email(action, c).await?,
			ActionConfig::CreateCalendarEvent(c) => self.create_calendar_event(c).await?,
			ActionConfig::CreateTask(c) => self.create_task(action, c).await?,
			ActionConfig::CallReminder(c) => self.call_reminder(action, c, Utc::now()).await?,
			ActionConfig::Webhook(c) => self.webhook(c).await?,
			ActionConfig::UpdateStepStatus(c) => self.update_step_status(action, c).await?,
		}

		info!(kind = %kind, "action executed");
		Ok(ActionOutcome::Executed(kind))
	}

	async fn send_email(&self, action: &ActionDefinition, config: SendEmailConfig) -> Result<(), ActionError> {
		const KIND: ActionKind = ActionKind::SendEmail;

		let subject = required(KIND, config.subject, "subject is required")?;
		let content = required(KIND, config.content, "content is required")?;
		let email = non_empty(config.email);
		let step_id = non_empty(Some(action.step_id.clone()));

		let recipient = match non_empty(config.to).map(|to| to.to_uppercase()) {
			None => match email {
				Some(email) => Recipient::Custom { email },
				None => return Err(ActionError::validation(KIND, "no recipient: both to and email are empty")),
			},
			Some(to) => match to.as_str() {
				"CUSTOM" => Recipient::Custom {
					email: email.ok_or_else(|| ActionError::validation(KIND, "CUSTOM recipient requires email"))?,
				},
				"PROCESS_OWNER" => Recipient::ProcessOwner {
					step_id: step_id.ok_or_else(|| ActionError::validation(KIND, "PROCESS_OWNER recipient requires a step id"))?,
				},
				"COUNTERPART" => Recipient::Counterpart { step_id },
				"ALL_COUNTERPARTS" => Recipient::AllCounterparts { step_id },
				"SYSTEM" => Recipient::System,
				other => return Err(ActionError::validation(KIND, format!("unknown recipient type {other}"))),
			},
		};

		let message = EmailMessage {
			recipient,
			subject,
			html: content.clone(),
			text: content,
			reply_to: non_empty(config.reply_to),
		};
		self
			.integrations
			.email
			.send_email(message)
			.await
			.map_err(|source| ActionError::Integration { kind: KIND, source })
	}

	async fn create_calendar_event(&self, config: CalendarEventConfig) -> Result<(), ActionError> {
		const KIND: ActionKind = ActionKind::CreateCalendarEvent;

		let title = required(KIND, config.title, "title is required")?;
		let start = required(KIND, config.start, "start time is required")?;
		let start = parse_timestamp(KIND, &start, "start")?;
		let minutes = config
			.duration_minutes
			.filter(|m| m.is_finite() && *m > 0.0)
			.unwrap_or(DEFAULT_EVENT_MINUTES);
		let end = Duration::try_milliseconds((minutes * 60_000.0).round() as i64)
			.and_then(|delta| start.checked_add_signed(delta))
			.ok_or_else(|| ActionError::validation(KIND, "durationMinutes is out of range"))?;

		let event = CalendarEvent {
			calendar_id: non_empty(config.calendar_id).unwrap_or_else(|| DEFAULT_CALENDAR.to_string()),
			title,
			description: non_empty(config.description),
			location: non_empty(config.location),
			start,
			end,
			attendees: config.attendees,
			color_id: non_empty(config.color_id),
		};
		self
			.integrations
			.calendar
			.create_event(event)
			.await
			.map_err(|source| ActionError::Integration { kind: KIND, source })
	}

	async fn create_task(&self, action: &ActionDefinition, config: CreateTaskConfig) -> Result<(), ActionError> {
		const KIND: ActionKind = ActionKind::CreateTask;

		let title = required(KIND, config.title, "title is required")?;
		let due = match non_empty(config.datetime) {
			Some(raw) => Some(parse_timestamp(KIND, &raw, "datetime")?),
			None => None,
		};

		let task = TaskRequest {
			title,
			description: non_empty(config.description),
			assignee: non_empty(config.assignee).unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
			due,
			step_id: action.step_id.clone(),
		};
		self
			.integrations
			.tasks
			.create_task(task)
			.await
			.map_err(|source| ActionError::Integration { kind: KIND, source })
	}

	async fn call_reminder(
		&self,
		action: &ActionDefinition,
		config: CallReminderConfig,
		now: DateTime<Utc>,
	) -> Result<(), ActionError> {
		const KIND: ActionKind = ActionKind::CallReminder;

		let days = config
			.days_from_now
			.ok_or_else(|| ActionError::validation(KIND, "daysFromNow is required"))?;
		if !days.is_finite() || days.fract() != 0.0 {
			return Err(ActionError::validation(KIND, "daysFromNow must be a whole number"));
		}
		if days < 0.0 {
			return Err(ActionError::validation(KIND, "daysFromNow must not be negative"));
		}
		let days = days as i64;
		let step_id = non_empty(Some(action.step_id.clone()))
			.ok_or_else(|| ActionError::validation(KIND, "a step id is required"))?;
		let execute_at = Duration::try_days(days)
			.and_then(|delta| now.checked_add_signed(delta))
			.ok_or_else(|| ActionError::validation(KIND, "daysFromNow is out of range"))?;

		let reminder = ReminderRequest {
			step_id,
			execute_at,
			days_from_now: days,
			note: non_empty(config.note),
		};
		self
			.integrations
			.reminders
			.schedule_reminder(reminder)
			.await
			.map_err(|source| ActionError::Integration { kind: KIND, source })
	}

	async fn webhook(&self, config: WebhookConfig) -> Result<(), ActionError> {
		const KIND: ActionKind = ActionKind::Webhook;

		let url = required(KIND, config.url, "url is required")?;
		let method = non_empty(config.method)
			.map(|m| m.to_uppercase())
			.unwrap_or_else(|| DEFAULT_WEBHOOK_METHOD.to_string());
		let body = matches!(method.as_str(), "POST" | "PUT" | "PATCH")
			.then(|| config.payload.unwrap_or_else(|| serde_json::json!({})));

		let request = WebhookRequest {
			url,
			method,
			headers: config.headers,
			body,
		};
		self
			.integrations
			.webhooks
			.send(request)
			.await
			.map_err(|source| ActionError::Integration { kind: KIND, source })
	}

	async fn update_step_status(
		&self,
		action: &ActionDefinition,
		config: UpdateStepStatusConfig,
	) -> Result<(), ActionError> {
		const KIND: ActionKind = ActionKind::UpdateStepStatus;

		let raw = required(KIND, config.status, "status is required")?;
		let status: StepStatus = raw.parse().map_err(|_| {
			ActionError::validation(
				KIND,
				format!("invalid status {raw}, expected one of completed, skipped, in_progress, failed"),
			)
		})?;
		let step_id = non_empty(Some(action.step_id.clone()))
			.ok_or_else(|| ActionError::validation(KIND, "a step id is required"))?;

		self
			.integrations
			.step_status
			.update_status(StepStatusUpdate { step_id, status })
			.await
			.map_err(|source| ActionError::Integration { kind: KIND, source })
	}
}

fn skip(reason: SkipReason) -> ActionOutcome {
	warn!(reason = %reason, "skipping action");
	ActionOutcome::Skipped(reason)
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

fn required(kind: ActionKind, value: Option<String>, message: &str) -> Result<String, ActionError> {
	non_empty(value).ok_or_else(|| ActionError::validation(kind, message))
}

fn parse_timestamp(kind: ActionKind, raw: &str, field: &str) -> Result<DateTime<Utc>, ActionError> {
	DateTime::parse_from_rfc3339(raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| ActionError::validation(kind, format!("{field} {raw} is not an RFC 3339 timestamp: {e}")))
}
