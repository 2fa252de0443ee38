// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message aggregation pipeline for the Corvo messaging assistant.
//!
//! The [`AgentLoop`] is the inbound coordinator that:
//! - Receives events from a channel adapter
//! - Routes text and media into the per-chat debounce aggregators
//! - Feeds typing signals into the text aggregator
//! - Hands finalized aggregates to the [`Dispatcher`]
//! - Handles graceful shutdown

pub mod album;
pub mod delay;
pub mod dispatcher;
pub mod shutdown;
pub mod text;

use std::sync::Arc;

use corvo_config::model::AggregatorConfig;
use corvo_core::types::{Aggregate, InboundEvent, InboundMessage, MessageContent, MessageId, TurnRole};
use corvo_core::{ChannelAdapter, CorvoError};
use corvo_storage::{queries, Database};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub use album::MediaAggregator;
pub use dispatcher::Dispatcher;
pub use text::TextAggregator;

/// The inbound event loop coordinating aggregation and dispatch.
///
/// Events for different chats are independent; events for one chat are
/// linearized by the aggregator registries. Dispatches run as spawned tasks
/// so a slow generation call never blocks event intake.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    dispatcher: Arc<Dispatcher>,
    db: Database,
    text_aggregator: TextAggregator,
    media_aggregator: MediaAggregator,
    aggregate_rx: Mutex<mpsc::Receiver<Aggregate>>,
}

impl AgentLoop {
    /// Creates the loop and its aggregators.
    pub fn new(
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        dispatcher: Arc<Dispatcher>,
        db: Database,
        aggregator_config: AggregatorConfig,
    ) -> Self {
        let (aggregate_tx, aggregate_rx) = mpsc::channel(64);
        Self {
            channel,
            dispatcher,
            db,
            text_aggregator: TextAggregator::new(aggregator_config.clone(), aggregate_tx.clone()),
            media_aggregator: MediaAggregator::new(aggregator_config, aggregate_tx),
            aggregate_rx: Mutex::new(aggregate_rx),
        }
    }

    /// Runs the loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), CorvoError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => {
                            if let Err(e) = self.handle_event(event).await {
                                error!(error = %e, "failed to handle inbound event");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            // If the channel is closed, break out of the loop.
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                aggregate = async { self.aggregate_rx.lock().await.recv().await } => {
                    match aggregate {
                        Some(aggregate) => {
                            let dispatcher = Arc::clone(&self.dispatcher);
                            tokio::spawn(async move {
                                dispatcher.dispatch(aggregate).await;
                            });
                        }
                        None => break,
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        self.db.close().await?;
        info!("agent loop stopped");
        Ok(())
    }

    /// Routes one inbound event.
    async fn handle_event(&self, event: InboundEvent) -> Result<(), CorvoError> {
        match event {
            InboundEvent::Typing { chat_id } => {
                self.text_aggregator.notify_typing(&chat_id).await;
                Ok(())
            }
            InboundEvent::Message(message) => self.handle_message(message).await,
        }
    }

    async fn handle_message(&self, message: InboundMessage) -> Result<(), CorvoError> {
        if message.chat_id.is_empty() {
            return Err(CorvoError::Data("message without chat id".into()));
        }

        // Messages sent by the assistant's own account enter history
        // directly and are never aggregated.
        if message.outgoing {
            let content = match &message.content {
                MessageContent::Text(text) => text.clone(),
                MessageContent::Media(item) => item
                    .caption
                    .clone()
                    .unwrap_or_else(|| "[media]".to_string()),
            };
            queries::turns::append(&self.db, &message.chat_id, TurnRole::Assistant, &content, &[])
                .await?;
            return Ok(());
        }

        if !message.private {
            debug!(chat_id = message.chat_id.as_str(), "ignoring non-private message");
            return Ok(());
        }

        match message.content {
            MessageContent::Text(text) => {
                if text.trim().is_empty() {
                    return Err(CorvoError::Data("text message without text".into()));
                }
                self.text_aggregator
                    .push(&message.chat_id, &text, MessageId(message.id))
                    .await;
            }
            MessageContent::Media(item) => {
                if item.file_id.is_empty() {
                    return Err(CorvoError::Data("media item without file reference".into()));
                }
                self.media_aggregator
                    .push(&message.chat_id, item, MessageId(message.id))
                    .await;
            }
        }

        Ok(())
    }
}
