// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation dispatcher: turns a finalized aggregate into a reply.
//!
//! Flow per aggregate: FAQ short-circuit, otherwise response generation with
//! the chat's recent history, then the reply/reaction side effects and the
//! history append. A dispatch failure is logged and swallowed; it must never
//! crash the aggregators or leave a buffer half-flushed, and it is terminal
//! for that one message.

use std::sync::Arc;
use std::time::Duration;

use corvo_config::model::DispatcherConfig;
use corvo_core::types::{
    now_rfc3339, Aggregate, ConversationTurn, GenerateRequest, MediaItem, MediaKind, MessageId,
    OutboundMessage, TurnRole,
};
use corvo_core::{ChannelAdapter, CorvoError, FaqMatcher, ResponderAdapter};
use corvo_storage::{queries, Database};
use tracing::{debug, error, warn};

/// Sentinel appended to history when a reply consisted of a reaction only,
/// so conversation context stays consistent.
pub const REACTION_SENT_MARKER: &str = "[reaction sent]";

/// Coordinates FAQ lookup, response generation, and delivery for one
/// aggregate at a time.
pub struct Dispatcher {
    db: Database,
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    responder: Arc<dyn ResponderAdapter + Send + Sync>,
    faq: Option<Arc<dyn FaqMatcher + Send + Sync>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        db: Database,
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        responder: Arc<dyn ResponderAdapter + Send + Sync>,
        faq: Option<Arc<dyn FaqMatcher + Send + Sync>>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            db,
            channel,
            responder,
            faq,
            config,
        }
    }

    /// Process one aggregate, logging and swallowing any failure.
    pub async fn dispatch(&self, aggregate: Aggregate) {
        let chat_id = aggregate.chat_id().to_string();
        if let Err(e) = self.dispatch_inner(aggregate).await {
            error!(error = %e, chat_id = chat_id.as_str(), "dispatch failed, reply dropped");
        }
    }

    async fn dispatch_inner(&self, aggregate: Aggregate) -> Result<(), CorvoError> {
        let (chat_id, content, attachments, reply_to) = match aggregate {
            Aggregate::Text {
                chat_id,
                content,
                reply_to,
            } => (chat_id, content, Vec::new(), reply_to),
            Aggregate::Album {
                chat_id,
                items,
                reply_to,
            } => {
                let content = album_content(&items);
                let attachments = expand_attachment_refs(&items, self.config.max_document_pages);
                (chat_id, content, attachments, reply_to)
            }
        };

        // Canned-answer short-circuit: on a hit, reply directly and skip
        // generation. A lookup failure falls through to generation.
        if let Some(faq) = &self.faq {
            match faq.lookup(&content).await {
                Ok(Some(answer)) => {
                    debug!(chat_id = chat_id.as_str(), "FAQ match, skipping generation");
                    queries::turns::append(&self.db, &chat_id, TurnRole::User, &content, &attachments)
                        .await?;
                    self.send_reply(&chat_id, &answer, reply_to).await?;
                    queries::turns::append(&self.db, &chat_id, TurnRole::Assistant, &answer, &[])
                        .await?;
                    return Ok(());
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "FAQ lookup failed, falling through to generation");
                }
            }
        }

        let mut history =
            queries::turns::recent(&self.db, &chat_id, self.config.history_limit).await?;
        history.push(ConversationTurn {
            id: 0,
            chat_id: chat_id.clone(),
            role: TurnRole::User,
            content: content.clone(),
            attachment_refs: attachments.clone(),
            created_at: now_rfc3339(),
        });

        let request = GenerateRequest {
            chat_id: chat_id.clone(),
            history,
            attachments: attachments.clone(),
            privileged: self.config.privileged_chats.contains(&chat_id),
        };

        let timeout = Duration::from_secs(self.config.generate_timeout_secs);
        let reply = tokio::time::timeout(timeout, self.responder.generate(request))
            .await
            .map_err(|_| CorvoError::Timeout { duration: timeout })??;

        // A reaction failure is logged but does not abort the text reply.
        if let Some(emoji) = &reply.reaction
            && let Err(e) = self.channel.send_reaction(&chat_id, &reply_to.0, emoji).await
        {
            warn!(error = %e, chat_id = chat_id.as_str(), "failed to send reaction");
        }

        queries::turns::append(&self.db, &chat_id, TurnRole::User, &content, &attachments).await?;

        match reply.text {
            Some(text) if !text.trim().is_empty() => {
                self.send_reply(&chat_id, &text, reply_to).await?;
                queries::turns::append(&self.db, &chat_id, TurnRole::Assistant, &text, &[]).await?;
            }
            _ if reply.reaction.is_some() => {
                queries::turns::append(
                    &self.db,
                    &chat_id,
                    TurnRole::Assistant,
                    REACTION_SENT_MARKER,
                    &[],
                )
                .await?;
            }
            _ => {
                debug!(chat_id = chat_id.as_str(), "responder stayed silent");
            }
        }

        Ok(())
    }

    async fn send_reply(
        &self,
        chat_id: &str,
        text: &str,
        reply_to: MessageId,
    ) -> Result<(), CorvoError> {
        self.channel
            .send(OutboundMessage {
                chat_id: chat_id.to_string(),
                content: text.to_string(),
                reply_to: Some(reply_to),
                parse_mode: None,
            })
            .await?;
        Ok(())
    }
}

/// History content for an album: captions in arrival order, or a bracketed
/// count when no item carries one.
fn album_content(items: &[MediaItem]) -> String {
    let captions: Vec<&str> = items
        .iter()
        .filter_map(|i| i.caption.as_deref())
        .filter(|c| !c.trim().is_empty())
        .collect();
    if captions.is_empty() {
        format!("[{} media]", items.len())
    } else {
        captions.join("\n")
    }
}

/// Build attachment references for generation.
///
/// Photos and single-page documents contribute one reference each. A
/// paginated document is expanded into one reference per page, capped at
/// `max_pages`.
pub fn expand_attachment_refs(items: &[MediaItem], max_pages: u32) -> Vec<String> {
    let mut refs = Vec::new();
    for item in items {
        match item.kind {
            MediaKind::Photo => refs.push(item.file_id.clone()),
            MediaKind::Document => {
                let pages = item.page_count.unwrap_or(1);
                if pages <= 1 {
                    refs.push(item.file_id.clone());
                } else {
                    for page in 1..=pages.min(max_pages) {
                        refs.push(format!("{}#page={page}", item.file_id));
                    }
                }
            }
        }
    }
    refs
}
