// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Corvo messaging assistant.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for inbound messages, reply delivery with MarkdownV2
//! fallback, typing indicators, and emoji reactions. The Bot API does not
//! deliver user typing notifications, so this adapter never produces
//! [`InboundEvent::Typing`]; the pipeline supports it for transports that do.

pub mod handler;
pub mod markdown;

use async_trait::async_trait;
use corvo_config::model::TelegramConfig;
use corvo_core::error::CorvoError;
use corvo_core::traits::{ChannelAdapter, PluginAdapter};
use corvo_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundEvent, MessageId, OutboundMessage,
};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, ParseMode, ReactionType, Recipient, ReplyParameters};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Connects to Telegram via long polling and forwards private and group
/// messages as inbound events; chat-type filtering happens downstream.
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, CorvoError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            CorvoError::Config("telegram.bot_token is required for the Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(CorvoError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, CorvoError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), CorvoError> {
        debug!("Telegram channel shutting down");
        // The polling handle is aborted when TelegramChannel is dropped.
        // For graceful shutdown, the agent loop stops calling receive() first.
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            supports_reactions: true,
            supports_media: true,
            max_message_length: Some(4096),
        }
    }

    async fn connect(&mut self) -> Result<(), CorvoError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    match handler::extract_content(&msg) {
                        Some(content) => {
                            let inbound = handler::to_inbound_message(&msg, content);
                            if tx.send(InboundEvent::Message(inbound)).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                        }
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {}) // Silently ignore non-message updates
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, CorvoError> {
        let chat_id = parse_chat_id(&msg.chat_id)?;
        let reply_params = msg
            .reply_to
            .as_ref()
            .and_then(|m| m.0.parse::<i32>().ok())
            .map(|id| {
                ReplyParameters::new(teloxide::types::MessageId(id)).allow_sending_without_reply()
            });

        let use_markdown =
            msg.parse_mode.as_deref() == Some("MarkdownV2") || msg.parse_mode.is_none();

        let sent = if use_markdown {
            // Try MarkdownV2 first, fall back to plain text.
            let escaped = markdown::escape_markdown_v2(&msg.content);
            let mut request = self
                .bot
                .send_message(Recipient::Id(chat_id), &escaped)
                .parse_mode(ParseMode::MarkdownV2);
            if let Some(rp) = reply_params.clone() {
                request = request.reply_parameters(rp);
            }

            match request.await {
                Ok(sent) => sent,
                Err(e) => {
                    warn!(error = %e, "MarkdownV2 send failed, retrying as plain text");
                    let mut request = self.bot.send_message(Recipient::Id(chat_id), &msg.content);
                    if let Some(rp) = reply_params {
                        request = request.reply_parameters(rp);
                    }
                    request.await.map_err(|e| CorvoError::Channel {
                        message: format!("failed to send message: {e}"),
                        source: Some(Box::new(e)),
                    })?
                }
            }
        } else {
            let mut request = self.bot.send_message(Recipient::Id(chat_id), &msg.content);
            if let Some(rp) = reply_params {
                request = request.reply_parameters(rp);
            }
            request.await.map_err(|e| CorvoError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            })?
        };

        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundEvent, CorvoError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| CorvoError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), CorvoError> {
        let chat_id = parse_chat_id(chat_id)?;

        self.bot
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
            .map_err(|e| CorvoError::Channel {
                message: format!("failed to send typing indicator: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(())
    }

    async fn send_reaction(
        &self,
        chat_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), CorvoError> {
        let chat_id = parse_chat_id(chat_id)?;
        let msg_id = message_id
            .parse::<i32>()
            .map(teloxide::types::MessageId)
            .map_err(|e| CorvoError::Channel {
                message: format!("invalid message_id: {e}"),
                source: None,
            })?;

        self.bot
            .set_message_reaction(chat_id, msg_id)
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await
            .map_err(|e| CorvoError::Channel {
                message: format!("failed to send reaction: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(())
    }
}

/// Parse the pipeline's string chat id into a Telegram `ChatId`.
fn parse_chat_id(chat_id: &str) -> Result<ChatId, CorvoError> {
    chat_id
        .parse::<i64>()
        .map(ChatId)
        .map_err(|e| CorvoError::Channel {
            message: format!("invalid chat_id `{chat_id}`: {e}"),
            source: None,
        })
}
