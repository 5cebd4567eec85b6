// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

use crate::config::ActionKind;

#[derive(Debug, Error)]
pub enum ActionError {
	#[error("invalid {kind} config: {source}")]
	InvalidConfig {
		kind: ActionKind,
		#[source]
		source: serde_json::Error,
	},

	#[error("{kind}: {message}")]
	Validation { kind: ActionKind, message: String },

	#[error("{kind} integration failed: {source}")]
	Integration {
		kind: ActionKind,
		#[source]
		source: IntegrationError,
	},
}

impl ActionError {
	pub(crate) fn validation(kind: ActionKind, message: impl Into<String>) -> Self {
		ActionError::Validation {
			kind,
			message: message.into(),
		}
	}
}

/// Failure reported by an integration collaborator.
#[derive(Debug, Error)]
pub enum IntegrationError {
	#[error("not supported: {0}")]
	Unsupported(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("unexpected status {status}: {body}")]
	Status { status: u16, body: String },

	#[error("{0}")]
	Other(String),
}
