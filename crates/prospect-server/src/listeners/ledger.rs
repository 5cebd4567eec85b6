// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process record of reminders that have already fired.
//!
//! Keyed by trigger id and scheduled date, so the same trigger can fire again
//! on a later day. Entries live for the process lifetime, pruned after a week.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

const RETENTION_DAYS: i64 = 7;

#[derive(Debug, Default)]
pub struct FiredTriggerLedger {
	fired: Mutex<HashMap<(String, NaiveDate), DateTime<Utc>>>,
}

impl FiredTriggerLedger {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<(String, NaiveDate), DateTime<Utc>>> {
		self.fired.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Record a firing. Returns `false` if this trigger already fired for
	/// `scheduled_for`.
	pub fn try_mark(&self, trigger_id: &str, scheduled_for: NaiveDate, now: DateTime<Utc>) -> bool {
		let mut fired = self.lock();
		let cutoff = now - Duration::days(RETENTION_DAYS);
		fired.retain(|_, marked_at| *marked_at >= cutoff);

		let key = (trigger_id.to_string(), scheduled_for);
		if fired.contains_key(&key) {
			return false;
		}
		fired.insert(key, now);
		true
	}

	/// Like [`try_mark`](Self::try_mark), but the mark is released again when
	/// the returned guard is dropped without [`FiredMark::keep`]. A delivery
	/// abandoned before its actions start (lookup error, timeout) therefore
	/// leaves the date free for a redelivery.
	pub fn claim(&self, trigger_id: &str, scheduled_for: NaiveDate, now: DateTime<Utc>) -> Option<FiredMark<'_>> {
		self.try_mark(trigger_id, scheduled_for, now).then(|| FiredMark {
			ledger: self,
			trigger_id: trigger_id.to_string(),
			scheduled_for,
			kept: false,
		})
	}

	/// Forget a firing so a later delivery can try again.
	pub fn release(&self, trigger_id: &str, scheduled_for: NaiveDate) {
		self.lock().remove(&(trigger_id.to_string(), scheduled_for));
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// A pending mark from [`FiredTriggerLedger::claim`].
#[must_use = "dropping the mark releases it"]
pub struct FiredMark<'a> {
	ledger: &'a FiredTriggerLedger,
	trigger_id: String,
	scheduled_for: NaiveDate,
	kept: bool,
}

impl FiredMark<'_> {
	pub fn keep(mut self) {
		self.kept = true;
	}
}

impl Drop for FiredMark<'_> {
	fn drop(&mut self) {
		if !self.kept {
			self.ledger.release(&self.trigger_id, self.scheduled_for);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn at(day: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2026, 10, day, 9, 0, 0).unwrap()
	}

	fn date(day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
	}

	#[test]
	fn test_second_mark_same_day_is_rejected() {
		let ledger = FiredTriggerLedger::new();
		assert!(ledger.try_mark("trg-1", date(18), at(18)));
		assert!(!ledger.try_mark("trg-1", date(18), at(18)));
		assert!(ledger.try_mark("trg-2", date(18), at(18)));
		assert!(ledger.try_mark("trg-1", date(19), at(19)));
	}

	#[test]
	fn test_release_allows_retry() {
		let ledger = FiredTriggerLedger::new();
		assert!(ledger.try_mark("trg-1", date(18), at(18)));
		ledger.release("trg-1", date(18));
		assert!(ledger.try_mark("trg-1", date(18), at(18)));
	}

	#[test]
	fn test_claim_released_on_drop_unless_kept() {
		let ledger = FiredTriggerLedger::new();
		let mark = ledger.claim("trg-1", date(18), at(18)).unwrap();
		assert!(ledger.claim("trg-1", date(18), at(18)).is_none());
		drop(mark);
		assert!(ledger.is_empty());

		ledger.claim("trg-1", date(18), at(18)).unwrap().keep();
		assert_eq!(ledger.len(), 1);
		assert!(ledger.claim("trg-1", date(18), at(18)).is_none());
	}

	#[test]
	fn test_old_entries_are_pruned() {
		let ledger = FiredTriggerLedger::new();
		assert!(ledger.try_mark("trg-1", date(1), at(1)));
		assert_eq!(ledger.len(), 1);
		assert!(ledger.try_mark("trg-2", date(18), at(18)));
		assert_eq!(ledger.len(), 1);
	}
}
