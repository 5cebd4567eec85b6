// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DAILY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time from `now` until the start of the next calendar day in `now`'s zone.
///
/// Always in `(0, DAILY]` for fixed-offset zones. If local midnight does not
/// exist on the next day (a DST gap), the first valid hour after it is used.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
	let tz = now.timezone();
	let Some(tomorrow) = now.date_naive().succ_opt() else {
		return DAILY;
	};

	let next = (0..3).find_map(|hour| {
		let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
		tz.from_local_datetime(&tomorrow.and_time(time)).earliest()
	});

	match next {
		Some(next) => (next.naive_utc() - now.naive_utc())
			.to_std()
			.unwrap_or(DAILY),
		None => DAILY,
	}
}

/// Delay until the next midnight in the host's local time zone.
pub fn until_next_local_midnight() -> Duration {
	duration_until_next_midnight(&Local::now())
}

/// When a job loop runs after its startup run.
///
/// The first scheduled run happens after `first_delay()` (evaluated when the
/// startup run finishes), then every `period`.
#[derive(Clone)]
pub struct Cadence {
	first_delay: Arc<dyn Fn() -> Duration + Send + Sync>,
	period: Duration,
}

impl Cadence {
	pub fn new(first_delay: impl Fn() -> Duration + Send + Sync + 'static, period: Duration) -> Self {
		Self {
			first_delay: Arc::new(first_delay),
			period,
		}
	}

	pub fn daily_at_midnight() -> Self {
		Self::new(until_next_local_midnight, DAILY)
	}

	pub fn fixed(first_delay: Duration, period: Duration) -> Self {
		Self::new(move || first_delay, period)
	}

	pub fn with_period(mut self, period: Duration) -> Self {
		self.period = period;
		self
	}

	pub fn first_delay(&self) -> Duration {
		(self.first_delay)()
	}

	pub fn period(&self) -> Duration {
		self.period
	}
}

impl Default for Cadence {
	fn default() -> Self {
		Self::daily_at_midnight()
	}
}

impl fmt::Debug for Cadence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cadence")
			.field("period", &self.period)
			.finish_non_exhaustive()
	}
}
