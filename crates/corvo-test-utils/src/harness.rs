// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full inbound pipeline with mock adapters and
//! a temp SQLite database: mock channel -> agent loop -> aggregators ->
//! dispatcher -> mock responder. Tests inject events and assert on the mock
//! channel's captured side effects.

use std::sync::Arc;

use corvo_agent::{AgentLoop, Dispatcher};
use corvo_config::model::CorvoConfig;
use corvo_core::types::{
    now_rfc3339, InboundEvent, InboundMessage, MediaItem, MessageContent,
};
use corvo_core::{CorvoError, FaqMatcher};
use corvo_storage::Database;
use tokio_util::sync::CancellationToken;

use crate::mock_channel::MockChannel;
use crate::mock_faq::MockFaq;
use crate::mock_responder::MockResponder;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    faq_entries: Vec<(String, String)>,
    config: CorvoConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            faq_entries: Vec::new(),
            config: CorvoConfig::default(),
        }
    }

    /// Pre-load mock responder replies.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    /// Enable the FAQ short-circuit with (pattern, answer) pairs.
    pub fn with_faq_entries(mut self, entries: Vec<(String, String)>) -> Self {
        self.faq_entries = entries;
        self
    }

    /// Override the configuration used to build the pipeline.
    pub fn with_config(mut self, config: CorvoConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, CorvoError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| CorvoError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;

        let channel = Arc::new(MockChannel::new());
        let responder = Arc::new(if self.replies.is_empty() {
            MockResponder::new()
        } else {
            MockResponder::with_replies(self.replies)
        });

        let faq: Option<Arc<dyn FaqMatcher + Send + Sync>> = if self.faq_entries.is_empty() {
            None
        } else {
            Some(Arc::new(MockFaq::with_entries(self.faq_entries)))
        };

        let dispatcher = Arc::new(Dispatcher::new(
            db.clone(),
            channel.clone(),
            responder.clone(),
            faq,
            self.config.dispatcher.clone(),
        ));

        let agent = Arc::new(AgentLoop::new(
            channel.clone(),
            dispatcher.clone(),
            db.clone(),
            self.config.aggregator.clone(),
        ));

        Ok(TestHarness {
            channel,
            responder,
            db,
            dispatcher,
            agent,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock channel adapter (inject events, read captured sends).
    pub channel: Arc<MockChannel>,
    /// The mock responder.
    pub responder: Arc<MockResponder>,
    /// SQLite storage (temp DB, cleaned up on drop).
    pub db: Database,
    /// The conversation dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// The agent loop wired to the mock channel.
    pub agent: Arc<AgentLoop>,
    /// Corvo configuration used for the pipeline.
    pub config: CorvoConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Spawn the agent loop in the background; returns its cancellation token.
    pub fn spawn_agent_loop(&self) -> CancellationToken {
        let agent = Arc::clone(&self.agent);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = agent.run(token).await {
                tracing::error!(error = %e, "agent loop failed in test harness");
            }
        });
        cancel
    }

    /// Inject an inbound private text message.
    pub async fn send_text(&self, chat_id: &str, message_id: &str, text: &str) {
        self.channel
            .inject_event(InboundEvent::Message(InboundMessage {
                id: message_id.to_string(),
                chat_id: chat_id.to_string(),
                sender_id: chat_id.to_string(),
                private: true,
                outgoing: false,
                content: MessageContent::Text(text.to_string()),
                timestamp: now_rfc3339(),
            }))
            .await;
    }

    /// Inject an inbound private media message.
    pub async fn send_media(&self, chat_id: &str, message_id: &str, item: MediaItem) {
        self.channel
            .inject_event(InboundEvent::Message(InboundMessage {
                id: message_id.to_string(),
                chat_id: chat_id.to_string(),
                sender_id: chat_id.to_string(),
                private: true,
                outgoing: false,
                content: MessageContent::Media(item),
                timestamp: now_rfc3339(),
            }))
            .await;
    }

    /// Inject a typing-start signal.
    pub async fn send_typing(&self, chat_id: &str) {
        self.channel
            .inject_event(InboundEvent::Typing {
                chat_id: chat_id.to_string(),
            })
            .await;
    }

    /// Wait until the mock channel has captured at least `n` sends.
    ///
    /// Database work runs on a thread outside the tokio clock, so paused-time
    /// tests must poll instead of asserting right after a timer fires.
    pub async fn wait_until_sent(&self, n: usize) -> Vec<corvo_core::types::OutboundMessage> {
        for _ in 0..1000 {
            if self.channel.sent_count().await >= n {
                return self.channel.sent_messages().await;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {n} captured send(s)");
    }

    /// Wait until a chat's history holds at least `n` turns.
    pub async fn wait_until_turns(
        &self,
        chat_id: &str,
        n: usize,
    ) -> Vec<corvo_core::types::ConversationTurn> {
        for _ in 0..1000 {
            let turns = corvo_storage::queries::turns::recent(&self.db, chat_id, n.max(16))
                .await
                .unwrap_or_default();
            if turns.len() >= n {
                return turns;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {n} history turn(s) in chat {chat_id}");
    }
}
