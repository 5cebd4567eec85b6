// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test helpers: an in-memory SQLite pool with seed functions, and a
//! pure in-memory store implementing every repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{DbError, Result};
use crate::posting::{sql_timestamp, PostingStore};
use crate::schema::apply_schema;
use crate::step::StepStore;
use crate::trigger::TriggerStore;
use crate::types::{
	ActionDefinition, DayRange, JobPosting, ProcessStep, TriggerDefinition, POSTING_STATUS_EXPIRED,
};

/// Single-connection pool so every query sees the same in-memory database.
pub async fn create_test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	apply_schema(&pool).await.unwrap();
	pool
}

pub async fn insert_posting(pool: &SqlitePool, id: &str, status: &str, ends_at: Option<DateTime<Utc>>) {
	sqlx::query(
		"INSERT INTO job_postings (id, title, company, job_posting_url, status, ends_at) VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(id)
	.bind(format!("Title {id}"))
	.bind(format!("Company {id}"))
	.bind(format!("https://jobs.example.com/{id}"))
	.bind(status)
	.bind(ends_at.map(sql_timestamp))
	.execute(pool)
	.await
	.unwrap();
}

pub async fn insert_step(pool: &SqlitePool, id: &str, name: &str) {
	sqlx::query(r#"INSERT INTO process_step (id, process_id, name, status, "order") VALUES (?, ?, ?, 'pending', 0)"#)
		.bind(id)
		.bind("process-1")
		.bind(name)
		.execute(pool)
		.await
		.unwrap();
}

pub async fn insert_action(pool: &SqlitePool, id: &str, step_id: &str, order: i32, config: &str) {
	sqlx::query(
		r#"INSERT INTO action_definition (id, step_id, name, is_public, "order", config) VALUES (?, ?, ?, 0, ?, ?)"#,
	)
	.bind(id)
	.bind(step_id)
	.bind(format!("Action {id}"))
	.bind(order)
	.bind(config)
	.execute(pool)
	.await
	.unwrap();
}

/// Column values for a seeded trigger row.
#[derive(Debug, Clone)]
pub struct TriggerSeed {
	pub id: String,
	pub trigger_code: String,
	pub execute_when: Option<String>,
	pub execute_at: Option<DateTime<Utc>>,
	pub config: String,
	pub expiration: Option<DateTime<Utc>>,
	pub step_id: Option<String>,
}

impl TriggerSeed {
	pub fn reminder(id: &str, execute_at: DateTime<Utc>) -> Self {
		Self {
			id: id.to_string(),
			trigger_code: "REMINDER".to_string(),
			execute_when: None,
			execute_at: Some(execute_at),
			config: r#"{"type":"REMINDER"}"#.to_string(),
			expiration: None,
			step_id: None,
		}
	}
}

pub async fn insert_trigger(pool: &SqlitePool, seed: &TriggerSeed) {
	sqlx::query(
		r#"
		INSERT INTO trigger_definition
			(id, "order", is_public, created_by, trigger_code, execute_when, execute_at, combinator, config, expiration, step_id)
		VALUES (?, 0, 0, 'user-1', ?, ?, ?, NULL, ?, ?, ?)
		"#,
	)
	.bind(&seed.id)
	.bind(&seed.trigger_code)
	.bind(&seed.execute_when)
	.bind(seed.execute_at.map(sql_timestamp))
	.bind(&seed.config)
	.bind(seed.expiration.map(sql_timestamp))
	.bind(&seed.step_id)
	.execute(pool)
	.await
	.unwrap();
}

/// A query the [`InMemoryStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailingQuery {
	FindExpired,
	FindExpiring,
	MarkExpired,
	FindScheduled,
	GetStep,
	ListActions,
}

#[derive(Default)]
struct State {
	postings: Vec<JobPosting>,
	triggers: Vec<TriggerDefinition>,
	steps: HashMap<String, ProcessStep>,
	actions: Vec<ActionDefinition>,
	failing: HashSet<FailingQuery>,
}

/// In-memory implementation of every store trait, with the same filtering
/// and ordering rules as the SQLite repositories.
#[derive(Default)]
pub struct InMemoryStore {
	state: Mutex<State>,
	step_fetches: AtomicUsize,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn check(&self, query: FailingQuery) -> Result<()> {
		if self.lock().failing.contains(&query) {
			return Err(DbError::Unavailable(format!("injected failure for {query:?}")));
		}
		Ok(())
	}

	pub fn add_posting(&self, posting: JobPosting) {
		self.lock().postings.push(posting);
	}

	pub fn add_trigger(&self, trigger: TriggerDefinition) {
		self.lock().triggers.push(trigger);
	}

	pub fn add_step(&self, step: ProcessStep) {
		self.lock().steps.insert(step.id.clone(), step);
	}

	pub fn add_action(&self, action: ActionDefinition) {
		self.lock().actions.push(action);
	}

	pub fn fail(&self, query: FailingQuery) {
		self.lock().failing.insert(query);
	}

	pub fn posting(&self, id: &str) -> Option<JobPosting> {
		self.lock().postings.iter().find(|p| p.id == id).cloned()
	}

	/// Number of `get_step` calls made so far.
	pub fn step_fetches(&self) -> usize {
		self.step_fetches.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl PostingStore for InMemoryStore {
	async fn find_expired(&self, before: DateTime<Utc>) -> Result<Vec<JobPosting>> {
		self.check(FailingQuery::FindExpired)?;
		let mut found: Vec<_> = self
			.lock()
			.postings
			.iter()
			.filter(|p| p.status != POSTING_STATUS_EXPIRED)
			.filter(|p| p.ends_at.is_some_and(|ends_at| ends_at < before))
			.cloned()
			.collect();
		found.sort_by(|a, b| b.ends_at.cmp(&a.ends_at));
		Ok(found)
	}

	async fn find_expiring(&self, window: DayRange) -> Result<Vec<JobPosting>> {
		self.check(FailingQuery::FindExpiring)?;
		let mut found: Vec<_> = self
			.lock()
			.postings
			.iter()
			.filter(|p| p.status != POSTING_STATUS_EXPIRED)
			.filter(|p| p.ends_at.is_some_and(|ends_at| window.contains(ends_at)))
			.cloned()
			.collect();
		found.sort_by(|a, b| a.ends_at.cmp(&b.ends_at));
		Ok(found)
	}

	async fn mark_expired(&self, id: &str) -> Result<bool> {
		self.check(FailingQuery::MarkExpired)?;
		let mut state = self.lock();
		match state
			.postings
			.iter_mut()
			.find(|p| p.id == id && p.status != POSTING_STATUS_EXPIRED)
		{
			Some(posting) => {
				posting.status = POSTING_STATUS_EXPIRED.to_string();
				Ok(true)
			}
			None => Ok(false),
		}
	}
}

#[async_trait]
impl TriggerStore for InMemoryStore {
	async fn find_scheduled(&self, trigger_code: &str, day: DayRange) -> Result<Vec<TriggerDefinition>> {
		self.check(FailingQuery::FindScheduled)?;
		let mut found: Vec<_> = self
			.lock()
			.triggers
			.iter()
			.filter(|t| t.trigger_code == trigger_code && t.execute_when.is_none())
			.filter(|t| t.execute_at.is_some_and(|at| day.contains(at)))
			.cloned()
			.collect();
		found.sort_by(|a, b| a.execute_at.cmp(&b.execute_at));
		Ok(found)
	}
}

#[async_trait]
impl StepStore for InMemoryStore {
	async fn get_step(&self, id: &str) -> Result<Option<ProcessStep>> {
		self.step_fetches.fetch_add(1, Ordering::SeqCst);
		self.check(FailingQuery::GetStep)?;
		Ok(self.lock().steps.get(id).cloned())
	}

	async fn list_actions(&self, step_id: &str) -> Result<Vec<ActionDefinition>> {
		self.check(FailingQuery::ListActions)?;
		let mut found: Vec<_> = self
			.lock()
			.actions
			.iter()
			.filter(|a| a.step_id == step_id)
			.cloned()
			.collect();
		found.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
		Ok(found)
	}
}
