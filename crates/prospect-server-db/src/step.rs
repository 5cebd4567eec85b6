// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::types::{parse_config, ActionDefinition, ProcessStep};

type StepRow = (String, Option<String>, String, String, i32);
type ActionRow = (String, String, String, bool, i32, String);

#[derive(Clone)]
pub struct StepRepository {
	pool: SqlitePool,
}

impl StepRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// The step without its actions.
	#[tracing::instrument(skip(self))]
	pub async fn get_step(&self, id: &str) -> Result<Option<ProcessStep>> {
		let row = sqlx::query_as::<_, StepRow>(
			r#"SELECT id, process_id, name, status, "order" FROM process_step WHERE id = ?"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(row.map(|(id, process_id, name, status, order)| ProcessStep {
			id,
			process_id,
			name,
			status,
			order,
			actions: Vec::new(),
		}))
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_actions(&self, step_id: &str) -> Result<Vec<ActionDefinition>> {
		let rows = sqlx::query_as::<_, ActionRow>(
			r#"
			SELECT id, step_id, name, is_public, "order", config
			FROM action_definition
			WHERE step_id = ?
			ORDER BY "order" ASC, id ASC
			"#,
		)
		.bind(step_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(
			rows
				.into_iter()
				.map(|(id, step_id, name, is_public, order, config)| {
					let config = parse_config(&config, &id);
					ActionDefinition {
						id,
						step_id,
						name,
						is_public,
						order,
						config,
					}
				})
				.collect(),
		)
	}
}

#[async_trait]
pub trait StepStore: Send + Sync {
	async fn get_step(&self, id: &str) -> Result<Option<ProcessStep>>;
	async fn list_actions(&self, step_id: &str) -> Result<Vec<ActionDefinition>>;

	/// Step joined with its actions in ascending order. Read fresh on every
	/// call.
	async fn get_step_with_actions(&self, id: &str) -> Result<Option<ProcessStep>> {
		let Some(mut step) = self.get_step(id).await? else {
			return Ok(None);
		};
		step.actions = self.list_actions(id).await?;
		Ok(Some(step))
	}
}

#[async_trait]
impl StepStore for StepRepository {
	async fn get_step(&self, id: &str) -> Result<Option<ProcessStep>> {
		self.get_step(id).await
	}

	async fn list_actions(&self, step_id: &str) -> Result<Vec<ActionDefinition>> {
		self.list_actions(step_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_action, insert_step};
	use serde_json::json;

	#[tokio::test]
	async fn test_get_step_with_actions_orders_by_order() {
		let pool = create_test_pool().await;
		insert_step(&pool, "step-1", "Interview").await;
		insert_action(&pool, "a3", "step-1", 3, r#"{"type":"WEBHOOK"}"#).await;
		insert_action(&pool, "a1", "step-1", 1, r#"{"type":"SEND_EMAIL"}"#).await;
		insert_action(&pool, "a2", "step-1", 2, r#"{"type":"CREATE_TASK"}"#).await;
		let repo = StepRepository::new(pool);

		let step = repo.get_step_with_actions("step-1").await.unwrap().unwrap();
		assert_eq!(step.name, "Interview");
		let ids: Vec<_> = step.actions.iter().map(|a| a.id.as_str()).collect();
		assert_eq!(ids, vec!["a1", "a2", "a3"]);
		assert_eq!(step.actions[0].config, json!({"type": "SEND_EMAIL"}));
	}

	#[tokio::test]
	async fn test_missing_step_is_none() {
		let repo = StepRepository::new(create_test_pool().await);
		assert!(repo.get_step("missing").await.unwrap().is_none());
		assert!(repo.get_step_with_actions("missing").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_step_without_actions() {
		let pool = create_test_pool().await;
		insert_step(&pool, "step-1", "Offer").await;
		let repo = StepRepository::new(pool);

		let step = repo.get_step_with_actions("step-1").await.unwrap().unwrap();
		assert!(step.actions.is_empty());
	}

	#[tokio::test]
	async fn test_actions_of_other_steps_are_excluded() {
		let pool = create_test_pool().await;
		insert_step(&pool, "step-1", "Screen").await;
		insert_step(&pool, "step-2", "Interview").await;
		insert_action(&pool, "a1", "step-1", 1, "{}").await;
		insert_action(&pool, "b1", "step-2", 1, "{}").await;
		let repo = StepRepository::new(pool);

		let actions = repo.list_actions("step-2").await.unwrap();
		assert_eq!(actions.len(), 1);
		assert_eq!(actions[0].id, "b1");
	}
}
