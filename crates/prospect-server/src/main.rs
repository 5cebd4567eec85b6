// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Prospect background worker binary.

use anyhow::Context;
use clap::{Parser, Subcommand};
use prospect_server::{build_scheduler, register_jobs, start_listeners};
use prospect_server_actions::{ActionExecutor, HttpWebhookClient, Integrations};
use prospect_server_config::{LogFormat, LoggingConfig, ServerConfig};
use prospect_server_db::{
	apply_schema, create_pool, PostingRepository, PostingStore, StepRepository, StepStore,
	TriggerRepository, TriggerStore,
};
use prospect_server_events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prospect worker - daily checks, reminders and step actions.
#[derive(Parser, Debug)]
#[command(name = "prospect-server", about = "Prospect background worker", version)]
struct Args {
	/// TOML config file, used in place of /etc/prospect/server.toml
	#[arg(long, env = "PROSPECT_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
	/// Run one job once, wait for its listeners, and exit
	RunJob {
		/// Job id, e.g. `expiration-check` or `reminder-check`
		job_id: String,
	},
	/// Publish one event from a JSON payload, wait for its listeners, and exit
	Publish {
		/// Event type, e.g. `trigger.reminder`
		event_type: String,
		/// Payload as a JSON object
		payload: String,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => prospect_server_config::load_config_with_file(path.clone()),
		None => prospect_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	init_tracing(&config.logging);

	tracing::info!(
		database = %config.database.url,
		version = env!("CARGO_PKG_VERSION"),
		"starting prospect-server"
	);

	run(config, args.command).await
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);
	match logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

async fn run(config: ServerConfig, command: Option<Command>) -> anyhow::Result<()> {
	let pool = create_pool(&config.database.url)
		.await
		.context("failed to open database")?;
	apply_schema(&pool).await.context("failed to apply schema")?;

	let postings: Arc<dyn PostingStore> = Arc::new(PostingRepository::new(pool.clone()));
	let triggers: Arc<dyn TriggerStore> = Arc::new(TriggerRepository::new(pool.clone()));
	let steps: Arc<dyn StepStore> = Arc::new(StepRepository::new(pool.clone()));

	let bus = EventBus::new(config.events.queue_capacity);

	let webhooks = HttpWebhookClient::new(config.actions.webhook_timeout())
		.context("failed to build webhook client")?;
	let executor = ActionExecutor::new(Integrations::logging().with_webhooks(Arc::new(webhooks)));

	start_listeners(
		&bus,
		steps,
		Arc::clone(&postings),
		executor,
		config.actions.listener_timeout(),
	);

	if let Some(Command::Publish { event_type, payload }) = &command {
		let payload: serde_json::Value =
			serde_json::from_str(payload).context("payload is not valid JSON")?;
		bus
			.publish_json(event_type, payload)
			.with_context(|| format!("rejected {event_type} event"))?;
		drain(&bus, config.actions.listener_timeout()).await;
		pool.close().await;
		return Ok(());
	}

	let mut scheduler = build_scheduler(&config.scheduler);
	register_jobs(&mut scheduler, &config.jobs, &bus, postings, triggers)?;

	if let Some(Command::RunJob { job_id }) = command {
		let output = scheduler.run_now(&job_id).await?;
		println!("{}", output.message);
		drain(&bus, config.actions.listener_timeout()).await;
		pool.close().await;
		return Ok(());
	}

	scheduler.start();
	tracing::info!("job scheduler started");

	shutdown_signal().await;
	tracing::info!("Received shutdown signal");

	tracing::info!("Shutting down job scheduler...");
	scheduler.stop().await;
	drain(&bus, config.scheduler.stop_timeout()).await;
	pool.close().await;

	tracing::info!("Server shutdown complete");
	Ok(())
}

/// Wait for queued events and running listeners, up to `limit`.
async fn drain(bus: &EventBus, limit: Duration) {
	if tokio::time::timeout(limit, bus.wait_idle()).await.is_err() {
		tracing::warn!(
			timeout_secs = limit.as_secs(),
			"event listeners still running at shutdown, abandoning them"
		);
	}
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
