// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message classification and content extraction.
//!
//! Maps a raw Telegram message into the channel-agnostic [`InboundMessage`]
//! consumed by the aggregation pipeline. Media is carried by platform file
//! reference only; nothing is downloaded here.

use corvo_core::types::{to_rfc3339, InboundMessage, MediaItem, MediaKind, MessageContent};
use teloxide::types::{ChatKind, Message};
use tracing::debug;

/// Whether the message arrived in a private (one-on-one) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_private(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Extracts content from a Telegram message.
///
/// Handles text, photo, and document message types. Returns `None` for
/// unsupported types (stickers, locations, voice notes, etc.).
pub fn extract_content(msg: &Message) -> Option<MessageContent> {
    if let Some(text) = msg.text() {
        if text.trim().is_empty() {
            return None;
        }
        return Some(MessageContent::Text(text.to_string()));
    }

    if let Some(photos) = msg.photo() {
        // Telegram provides multiple sizes; the last one is the largest.
        let largest = photos.last()?;
        return Some(MessageContent::Media(MediaItem {
            kind: MediaKind::Photo,
            file_id: largest.file.id.to_string(),
            caption: msg.caption().map(|c| c.to_string()),
            file_name: None,
            page_count: None,
        }));
    }

    if let Some(doc) = msg.document() {
        // The Bot API does not report page counts; paginated handling
        // downstream treats an unknown count as a single page.
        return Some(MessageContent::Media(MediaItem {
            kind: MediaKind::Document,
            file_id: doc.file.id.to_string(),
            caption: msg.caption().map(|c| c.to_string()),
            file_name: doc.file_name.clone(),
            page_count: None,
        }));
    }

    debug!(msg_id = msg.id.0, "ignoring unsupported message type");
    None
}

/// Converts a Telegram message and extracted content into an [`InboundMessage`].
pub fn to_inbound_message(msg: &Message, content: MessageContent) -> InboundMessage {
    let sender_id = msg
        .from
        .as_ref()
        .map(|u| u.id.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    InboundMessage {
        id: msg.id.0.to_string(),
        chat_id: msg.chat.id.0.to_string(),
        sender_id,
        private: is_private(msg),
        // The Bot API never delivers the bot's own messages.
        outgoing: false,
        content,
        timestamp: to_rfc3339(msg.date),
    }
}
