// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging platform integrations.

use async_trait::async_trait;

use crate::error::CorvoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundEvent, MessageId, OutboundMessage};

/// Adapter for bidirectional messaging channel integrations.
///
/// Channel adapters connect Corvo to external messaging platforms, handling
/// event ingestion, message delivery, and the typing/reaction side effects
/// the delivery pipeline depends on.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), CorvoError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, CorvoError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundEvent, CorvoError>;

    /// Shows a typing indicator to the given chat.
    async fn send_typing(&self, chat_id: &str) -> Result<(), CorvoError>;

    /// Reacts to a message with an emoji.
    async fn send_reaction(
        &self,
        chat_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), CorvoError>;
}
