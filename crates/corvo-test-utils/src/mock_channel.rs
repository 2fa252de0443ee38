// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and captured outbound side effects (messages, typing indicators,
//! reactions) for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use corvo_core::traits::adapter::PluginAdapter;
use corvo_core::traits::channel::ChannelAdapter;
use corvo_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundEvent, MessageId, OutboundMessage,
};
use corvo_core::CorvoError;

/// A mock messaging channel for testing.
///
/// Provides an inbound queue fed via `inject_event()` and capture buffers
/// for everything the pipeline sends out. Sends can be made to fail with
/// `fail_next_sends()` to exercise failure paths.
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    typing: Arc<Mutex<Vec<String>>>,
    reactions: Arc<Mutex<Vec<(String, String, String)>>>,
    failures_remaining: Arc<Mutex<u32>>,
    notify: Arc<Notify>,
    next_message_id: Arc<Mutex<u64>>,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            typing: Arc::new(Mutex::new(Vec::new())),
            reactions: Arc::new(Mutex::new(Vec::new())),
            failures_remaining: Arc::new(Mutex::new(0)),
            notify: Arc::new(Notify::new()),
            next_message_id: Arc::new(Mutex::new(0)),
        }
    }

    /// Inject an inbound event into the receive queue.
    ///
    /// The next call to `receive()` will return this event.
    pub async fn inject_event(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Make the next `n` calls to `send()` fail.
    pub async fn fail_next_sends(&self, n: u32) {
        *self.failures_remaining.lock().await = n;
    }

    /// All messages passed to `send()` so far.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear the sent-message capture buffer.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Chat ids that received a typing indicator, in order.
    pub async fn typing_indicators(&self) -> Vec<String> {
        self.typing.lock().await.clone()
    }

    /// Reactions sent as (chat_id, message_id, emoji) tuples.
    pub async fn reactions(&self) -> Vec<(String, String, String)> {
        self.reactions.lock().await.clone()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, CorvoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CorvoError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            supports_reactions: true,
            supports_media: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), CorvoError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, CorvoError> {
        {
            let mut failures = self.failures_remaining.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(CorvoError::Channel {
                    message: "mock send failure".into(),
                    source: None,
                });
            }
        }
        let mut next_id = self.next_message_id.lock().await;
        *next_id += 1;
        let id = format!("mock-msg-{}", *next_id);
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundEvent, CorvoError> {
        loop {
            // Try to pop from queue
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            // Wait for notification that a new event was injected
            self.notify.notified().await;
        }
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), CorvoError> {
        self.typing.lock().await.push(chat_id.to_string());
        Ok(())
    }

    async fn send_reaction(
        &self,
        chat_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), CorvoError> {
        self.reactions.lock().await.push((
            chat_id.to_string(),
            message_id.to_string(),
            emoji.to_string(),
        ));
        Ok(())
    }
}
