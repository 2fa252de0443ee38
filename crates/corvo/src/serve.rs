// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `corvo serve` command implementation.
//!
//! Starts the full pipeline: SQLite storage, the Telegram channel, the
//! Anthropic responder, the conversation dispatcher with its aggregators,
//! and the three delivery workers. Supports graceful shutdown via signal
//! handlers; on startup, broadcast jobs interrupted by a previous crash are
//! marked failed rather than resumed.

use std::sync::Arc;

use chrono::Utc;
use corvo_agent::{shutdown, AgentLoop, Dispatcher};
use corvo_config::model::CorvoConfig;
use corvo_core::error::CorvoError;
use corvo_core::{ChannelAdapter, ResponderAdapter, StorageAdapter};
use corvo_delivery::{BroadcastWorker, ResponseQueueWorker, TriggerScheduler};
use corvo_storage::Database;
use tracing::{error, info};

#[cfg(feature = "anthropic")]
use corvo_anthropic::AnthropicResponder;

#[cfg(feature = "telegram")]
use corvo_telegram::TelegramChannel;

/// Runs the `corvo serve` command.
pub async fn run_serve(config: CorvoConfig) -> Result<(), CorvoError> {
    // Initialize tracing subscriber.
    init_tracing(&config.agent.log_level);

    info!(assistant = config.agent.name.as_str(), "starting corvo serve");

    // Initialize storage (runs migrations).
    let db = Database::open_with_options(&config.storage.database_path, config.storage.wal_mode)
        .await?;
    StorageAdapter::initialize(&db).await?;

    // Initialize the Telegram channel.
    #[cfg(feature = "telegram")]
    let channel: Arc<dyn ChannelAdapter + Send + Sync> = {
        let mut telegram = TelegramChannel::new(config.telegram.clone()).map_err(|e| {
            error!(error = %e, "failed to initialize Telegram channel");
            eprintln!(
                "error: Telegram bot token required. Set telegram.bot_token or CORVO_TELEGRAM_BOT_TOKEN."
            );
            e
        })?;
        telegram.connect().await?;
        info!("telegram channel connected");
        Arc::new(telegram)
    };

    #[cfg(not(feature = "telegram"))]
    compile_error!("corvo requires the 'telegram' feature for the messaging channel");

    // Initialize the Anthropic responder.
    #[cfg(feature = "anthropic")]
    let responder: Arc<dyn ResponderAdapter + Send + Sync> = {
        let responder = AnthropicResponder::new(&config.anthropic).map_err(|e| {
            error!(error = %e, "failed to initialize Anthropic responder");
            eprintln!(
                "error: Anthropic API key required. Set anthropic.api_key or ANTHROPIC_API_KEY."
            );
            e
        })?;
        Arc::new(responder)
    };

    #[cfg(not(feature = "anthropic"))]
    compile_error!("corvo requires the 'anthropic' feature for response generation");

    // Build the dispatcher and the agent loop.
    let dispatcher = Arc::new(Dispatcher::new(
        db.clone(),
        Arc::clone(&channel),
        responder,
        None, // FAQ lookup is an optional external collaborator.
        config.dispatcher.clone(),
    ));
    let agent = Arc::new(AgentLoop::new(
        Arc::clone(&channel),
        dispatcher,
        db.clone(),
        config.aggregator.clone(),
    ));

    // Build the delivery workers.
    let response_worker = Arc::new(ResponseQueueWorker::new(
        db.clone(),
        Arc::clone(&channel),
        config.delivery.clone(),
    ));
    let broadcast_worker = Arc::new(BroadcastWorker::new(
        db.clone(),
        Arc::clone(&channel),
        config.broadcast.clone(),
    ));
    let scheduler = Arc::new(TriggerScheduler::new(db.clone(), config.scheduler.clone())?);

    // Crash recovery: fail broadcast jobs left in processing.
    broadcast_worker.recover_stale(Utc::now()).await?;

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the worker loops.
    {
        let worker = Arc::clone(&response_worker);
        let token = cancel.clone();
        tokio::spawn(async move { worker.run(token).await });
    }
    {
        let worker = Arc::clone(&broadcast_worker);
        let token = cancel.clone();
        tokio::spawn(async move { worker.run(token).await });
    }
    {
        let worker = Arc::clone(&scheduler);
        let token = cancel.clone();
        tokio::spawn(async move { worker.run(token).await });
    }
    info!(
        delivery_poll_ms = config.delivery.poll_interval_ms,
        broadcast_poll_secs = config.broadcast.poll_interval_secs,
        scheduler_poll_secs = config.scheduler.poll_interval_secs,
        timezone = config.scheduler.timezone.as_str(),
        "delivery workers started"
    );

    // Run the inbound loop until shutdown.
    agent.run(cancel).await?;

    info!("corvo serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("corvo={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
