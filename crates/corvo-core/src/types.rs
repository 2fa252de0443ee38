// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Corvo pipeline.
//!
//! Timestamps are RFC 3339 UTC strings with millisecond precision and a `Z`
//! suffix, so lexicographic order equals chronological order everywhere a
//! string comparison is used (including SQL).

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The canonical timestamp format used across the workspace: RFC 3339 UTC
/// with millisecond precision and a `Z` suffix.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format an arbitrary instant in the canonical timestamp format.
pub fn to_rfc3339(t: chrono::DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Unique identifier for a platform message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the plugin registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Responder,
    Storage,
}

// --- Inbound events ---

/// Kind of media attachment, detected by the channel adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Document,
}

/// A single media attachment carried by an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub kind: MediaKind,
    /// Platform file reference, resolvable by the channel adapter.
    pub file_id: String,
    pub caption: Option<String>,
    pub file_name: Option<String>,
    /// Page count for paginated documents, when the transport reports one.
    /// `None` is treated as a single page downstream.
    pub page_count: Option<u32>,
}

/// Content of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Media(MediaItem),
}

/// A message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Platform message id (used as the reply-to reference).
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    /// Whether the message arrived in a private (one-on-one) chat.
    pub private: bool,
    /// Whether the message was sent *by* the assistant's own account.
    /// Outgoing messages are recorded into history but never aggregated.
    pub outgoing: bool,
    pub content: MessageContent,
    pub timestamp: String,
}

/// An event received from a channel adapter.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Message(InboundMessage),
    /// The user started typing. Only ever extends an active text buffer;
    /// never creates one.
    Typing { chat_id: String },
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub content: String,
    /// Message to reply to, if the platform supports threading replies.
    pub reply_to: Option<MessageId>,
    pub parse_mode: Option<String>,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_typing: bool,
    pub supports_reactions: bool,
    pub supports_media: bool,
    pub max_message_length: Option<usize>,
}

// --- Aggregates ---

/// The coalesced content produced by a debounce buffer, handed to the
/// dispatcher as one logical user turn.
#[derive(Debug, Clone)]
pub enum Aggregate {
    /// Consecutive text messages joined with newlines, in arrival order.
    Text {
        chat_id: String,
        content: String,
        /// The latest contributing message, used to address the reply.
        reply_to: MessageId,
    },
    /// Media items collected within one album window, in arrival order.
    Album {
        chat_id: String,
        items: Vec<MediaItem>,
        reply_to: MessageId,
    },
}

impl Aggregate {
    /// The chat this aggregate belongs to.
    pub fn chat_id(&self) -> &str {
        match self {
            Aggregate::Text { chat_id, .. } => chat_id,
            Aggregate::Album { chat_id, .. } => chat_id,
        }
    }
}

// --- Conversation history ---

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in the append-only conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Rowid, 0 before insertion.
    pub id: i64,
    pub chat_id: String,
    pub role: TurnRole,
    pub content: String,
    /// Attachment references visible to response generation.
    pub attachment_refs: Vec<String>,
    pub created_at: String,
}

// --- Delivery queue ---

/// Lifecycle of a pending (pre-scheduled) response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Sent,
    Failed,
}

/// A pre-scheduled outbound message, consumed exactly once by the response
/// queue worker. `typing_sent` is an orthogonal idempotency flag, not a state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResponse {
    pub id: i64,
    pub chat_id: String,
    pub message: String,
    pub reply_to_message_id: Option<String>,
    pub scheduled_for: String,
    pub typing_sent: bool,
    pub status: ResponseStatus,
    pub created_at: String,
    pub updated_at: String,
}

// --- Broadcasts ---

/// Lifecycle of a broadcast job. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A single bulk-send task targeting all currently valid subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastJob {
    pub id: i64,
    pub message: String,
    pub status: JobStatus,
    pub sent_count: i64,
    pub failed_count: i64,
    /// Chat ids of recipients whose send failed.
    pub failed_recipients: Vec<String>,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A daily wall-clock time rule that enqueues a broadcast job when fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTrigger {
    pub id: i64,
    pub message: String,
    /// `HH:MM` in the scheduler's configured timezone.
    pub time_of_day: String,
    pub is_active: bool,
    pub last_run_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A broadcast recipient with a validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub chat_id: String,
    pub starts_at: String,
    /// `None` means unbounded.
    pub ends_at: Option<String>,
    pub created_at: String,
}

// --- Response generation ---

/// A request to the response generation collaborator.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub chat_id: String,
    /// Prior turns plus the new user turn, oldest first.
    pub history: Vec<ConversationTurn>,
    /// Attachment references for the new user turn, already expanded.
    pub attachments: Vec<String>,
    pub privileged: bool,
}

/// The outcome of a generation call. The responder may elect a reaction
/// instead of, or in addition to, text.
#[derive(Debug, Clone, Default)]
pub struct GeneratedReply {
    pub text: Option<String>,
    /// Emoji to react to the triggering message with.
    pub reaction: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_enums_round_trip_as_lowercase() {
        assert_eq!(JobStatus::Processing.to_string(), "processing");
        assert_eq!(JobStatus::from_str("completed").unwrap(), JobStatus::Completed);
        assert_eq!(ResponseStatus::Sent.to_string(), "sent");
        assert_eq!(ResponseStatus::from_str("pending").unwrap(), ResponseStatus::Pending);
        assert_eq!(TurnRole::Assistant.to_string(), "assistant");
        assert_eq!(TurnRole::from_str("user").unwrap(), TurnRole::User);
        assert_eq!(MediaKind::Document.to_string(), "document");
        assert_eq!(MediaKind::from_str("photo").unwrap(), MediaKind::Photo);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(JobStatus::from_str("PENDING").is_err());
        assert!(ResponseStatus::from_str("done").is_err());
    }

    #[test]
    fn media_item_serde_round_trip() {
        let item = MediaItem {
            kind: MediaKind::Document,
            file_id: "file-123".into(),
            caption: Some("quarterly report".into()),
            file_name: Some("report.pdf".into()),
            page_count: Some(12),
        };
        let json = serde_json::to_string(&item).unwrap();
        let back: MediaItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
        assert!(json.contains("\"document\""));
    }

    #[test]
    fn aggregate_chat_id_accessor() {
        let text = Aggregate::Text {
            chat_id: "42".into(),
            content: "hi".into(),
            reply_to: MessageId("1".into()),
        };
        let album = Aggregate::Album {
            chat_id: "43".into(),
            items: vec![],
            reply_to: MessageId("2".into()),
        };
        assert_eq!(text.chat_id(), "42");
        assert_eq!(album.chat_id(), "43");
    }

    #[test]
    fn canonical_timestamps_sort_chronologically() {
        let earlier = to_rfc3339(chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let later = to_rfc3339(chrono::DateTime::from_timestamp(1_700_000_001, 500_000_000).unwrap());
        assert!(earlier < later);
        assert!(earlier.ends_with('Z'));
        // Millisecond precision, fixed width
        assert_eq!(earlier.len(), later.len());
    }

    #[test]
    fn adapter_type_round_trip() {
        for variant in [AdapterType::Channel, AdapterType::Responder, AdapterType::Storage] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }
}
