// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration double that records every call in order.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::ActionKind;
use crate::error::IntegrationError;
use crate::integrations::{
	CalendarEvent, CalendarService, EmailMessage, EmailSender, ReminderRequest, ReminderScheduler,
	StepStatusUpdate, StepStatusUpdater, TaskRequest, TaskService, WebhookClient, WebhookRequest,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
	Email(EmailMessage),
	Calendar(CalendarEvent),
	Task(TaskRequest),
	Reminder(ReminderRequest),
	Webhook(WebhookRequest),
	StepStatus(StepStatusUpdate),
}

impl Call {
	pub fn kind(&self) -> ActionKind {
		match self {
			Call::Email(_) => ActionKind::SendEmail,
			Call::Calendar(_) => ActionKind::CreateCalendarEvent,
			Call::Task(_) => ActionKind::CreateTask,
			Call::Reminder(_) => ActionKind::CallReminder,
			Call::Webhook(_) => ActionKind::Webhook,
			Call::StepStatus(_) => ActionKind::UpdateStepStatus,
		}
	}
}

#[derive(Default)]
struct Inner {
	calls: Vec<Call>,
	failing: HashSet<ActionKind>,
}

/// Records calls; kinds registered with `fail_on` record the call and then
/// return an error.
#[derive(Default)]
pub struct RecordingIntegrations {
	inner: Mutex<Inner>,
}

impl RecordingIntegrations {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn fail_on(&self, kind: ActionKind) {
		self.lock().failing.insert(kind);
	}

	pub fn calls(&self) -> Vec<Call> {
		self.lock().calls.clone()
	}

	fn lock(&self) -> MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn record(&self, call: Call) -> Result<(), IntegrationError> {
		let kind = call.kind();
		let mut inner = self.lock();
		inner.calls.push(call);
		if inner.failing.contains(&kind) {
			return Err(IntegrationError::Other(format!("injected {kind} failure")));
		}
		Ok(())
	}
}

#[async_trait]
impl EmailSender for RecordingIntegrations {
	async fn send_email(&self, message: EmailMessage) -> Result<(), IntegrationError> {
		self.record(Call::Email(message))
	}
}

#[async_trait]
impl CalendarService for RecordingIntegrations {
	async fn create_event(&self, event: CalendarEvent) -> Result<(), IntegrationError> {
		self.record(Call::Calendar(event))
	}
}

#[async_trait]
impl TaskService for RecordingIntegrations {
	async fn create_task(&self, task: TaskRequest) -> Result<(), IntegrationError> {
		self.record(Call::Task(task))
	}
}

#[async_trait]
impl ReminderScheduler for RecordingIntegrations {
	async fn schedule_reminder(&self, reminder: ReminderRequest) -> Result<(), IntegrationError> {
		self.record(Call::Reminder(reminder))
	}
}

#[async_trait]
impl WebhookClient for RecordingIntegrations {
	async fn send(&self, request: WebhookRequest) -> Result<(), IntegrationError> {
		self.record(Call::Webhook(request))
	}
}

#[async_trait]
impl StepStatusUpdater for RecordingIntegrations {
	async fn update_status(&self, update: StepStatusUpdate) -> Result<(), IntegrationError> {
		self.record(Call::StepStatus(update))
	}
}
