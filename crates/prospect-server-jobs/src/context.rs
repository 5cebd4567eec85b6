// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::types::TriggerSource;
use std::sync::Arc;
use tokio::sync::watch;

pub struct JobContext {
	pub run_id: String,
	pub triggered_by: TriggerSource,
	pub cancellation_token: CancellationToken,
}

/// Shared one-way cancellation flag. Clones observe the same flag.
#[derive(Clone)]
pub struct CancellationToken {
	cancelled: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
	pub fn new() -> Self {
		let (tx, _) = watch::channel(false);
		Self {
			cancelled: Arc::new(tx),
		}
	}

	pub fn cancel(&self) {
		self.cancelled.send_replace(true);
	}

	pub fn is_cancelled(&self) -> bool {
		*self.cancelled.borrow()
	}

	/// Resolves once `cancel` has been called on any clone.
	pub async fn cancelled(&self) {
		let mut rx = self.cancelled.subscribe();
		// The sender lives in `self`, so the channel cannot close under us.
		let _ = rx.wait_for(|cancelled| *cancelled).await;
	}
}

impl Default for CancellationToken {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn test_cancel_is_visible_to_clones() {
		let token = CancellationToken::new();
		let clone = token.clone();
		assert!(!clone.is_cancelled());

		token.cancel();
		assert!(clone.is_cancelled());
	}

	#[tokio::test]
	async fn test_cancelled_resolves_after_cancel() {
		let token = CancellationToken::new();
		let waiter = token.clone();
		let handle = tokio::spawn(async move { waiter.cancelled().await });

		tokio::time::sleep(Duration::from_millis(10)).await;
		assert!(!handle.is_finished());

		token.cancel();
		tokio::time::timeout(Duration::from_secs(1), handle)
			.await
			.unwrap()
			.unwrap();
	}

	#[tokio::test]
	async fn test_cancelled_resolves_immediately_when_already_cancelled() {
		let token = CancellationToken::new();
		token.cancel();
		tokio::time::timeout(Duration::from_millis(100), token.cancelled())
			.await
			.unwrap();
	}
}
