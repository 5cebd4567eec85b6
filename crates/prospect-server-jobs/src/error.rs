// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
	#[error("job failed: {message}")]
	Failed { message: String, retryable: bool },

	#[error("job cancelled")]
	Cancelled,

	#[error("job not found: {0}")]
	NotFound(String),

	#[error("invalid scheduler state: {0}")]
	InvalidState(String),
}

pub type Result<T> = std::result::Result<T, JobError>;
