// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Corvo messaging assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Corvo configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CorvoConfig {
    /// Assistant identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Anthropic API settings for the responder.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Text and media aggregation settings.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Conversation dispatcher settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Response queue worker settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Broadcast worker settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Daily trigger scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Assistant identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "corvo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// Anthropic API configuration for the responder adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to use for reply generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// System prompt defining the assistant persona.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            system_prompt: None,
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("corvo").join("corvo.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("corvo.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Text and media aggregation configuration.
///
/// The delay heuristic assumes short fragments ("ok", "and") are likely to
/// be followed by more typing, while long messages are complete thoughts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Debounce for texts shorter than `short_max_chars`.
    #[serde(default = "default_short_delay_ms")]
    pub short_delay_ms: u64,

    /// Debounce for texts shorter than `medium_max_chars`.
    #[serde(default = "default_medium_delay_ms")]
    pub medium_delay_ms: u64,

    /// Debounce for longer texts.
    #[serde(default = "default_long_delay_ms")]
    pub long_delay_ms: u64,

    /// Upper bound (exclusive) of the "short" length band, in characters.
    #[serde(default = "default_short_max_chars")]
    pub short_max_chars: usize,

    /// Upper bound (exclusive) of the "medium" length band, in characters.
    #[serde(default = "default_medium_max_chars")]
    pub medium_max_chars: usize,

    /// Timer extension applied when a typing-start event arrives for a chat
    /// with an active text buffer.
    #[serde(default = "default_typing_extension_ms")]
    pub typing_extension_ms: u64,

    /// Fixed window for grouping rapidly-arriving media into one album.
    #[serde(default = "default_album_window_ms")]
    pub album_window_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            short_delay_ms: default_short_delay_ms(),
            medium_delay_ms: default_medium_delay_ms(),
            long_delay_ms: default_long_delay_ms(),
            short_max_chars: default_short_max_chars(),
            medium_max_chars: default_medium_max_chars(),
            typing_extension_ms: default_typing_extension_ms(),
            album_window_ms: default_album_window_ms(),
        }
    }
}

fn default_short_delay_ms() -> u64 {
    3500
}

fn default_medium_delay_ms() -> u64 {
    2500
}

fn default_long_delay_ms() -> u64 {
    1500
}

fn default_short_max_chars() -> usize {
    15
}

fn default_medium_max_chars() -> usize {
    50
}

fn default_typing_extension_ms() -> u64 {
    2500
}

fn default_album_window_ms() -> u64 {
    3500
}

/// Conversation dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Number of recent turns loaded as generation context.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Cap on per-page attachment references expanded from one document.
    #[serde(default = "default_max_document_pages")]
    pub max_document_pages: u32,

    /// Upper bound on a single generation call.
    #[serde(default = "default_generate_timeout_secs")]
    pub generate_timeout_secs: u64,

    /// Chat ids whose requests are flagged privileged to the responder.
    #[serde(default)]
    pub privileged_chats: Vec<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            max_document_pages: default_max_document_pages(),
            generate_timeout_secs: default_generate_timeout_secs(),
            privileged_chats: Vec::new(),
        }
    }
}

fn default_history_limit() -> usize {
    40
}

fn default_max_document_pages() -> u32 {
    10
}

fn default_generate_timeout_secs() -> u64 {
    30
}

/// Response queue worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Poll interval for the pending-response queue.
    #[serde(default = "default_delivery_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How far ahead of `scheduled_for` a row becomes visible to a poll.
    #[serde(default = "default_lookahead_secs")]
    pub lookahead_secs: u64,

    /// Lead time before the send at which the typing indicator is emitted.
    #[serde(default = "default_typing_lead_secs")]
    pub typing_lead_secs: u64,

    /// Upper bound on a single outbound send.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_delivery_poll_interval_ms(),
            lookahead_secs: default_lookahead_secs(),
            typing_lead_secs: default_typing_lead_secs(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_delivery_poll_interval_ms() -> u64 {
    1000
}

fn default_lookahead_secs() -> u64 {
    5
}

fn default_typing_lead_secs() -> u64 {
    3
}

fn default_send_timeout_secs() -> u64 {
    5
}

/// Broadcast worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Poll interval for pending broadcast jobs.
    #[serde(default = "default_broadcast_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Pause between consecutive recipient sends (platform rate limits).
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    /// Upper bound on a single recipient send.
    #[serde(default = "default_broadcast_send_timeout_secs")]
    pub send_timeout_secs: u64,

    /// Age after which a `processing` job found at startup is considered
    /// interrupted and marked failed.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_broadcast_poll_interval_secs(),
            send_delay_ms: default_send_delay_ms(),
            send_timeout_secs: default_broadcast_send_timeout_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

fn default_broadcast_send_timeout_secs() -> u64 {
    5
}

fn default_broadcast_poll_interval_secs() -> u64 {
    30
}

fn default_send_delay_ms() -> u64 {
    200
}

fn default_stale_after_secs() -> u64 {
    600
}

/// Daily trigger scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Poll interval for scheduled triggers.
    #[serde(default = "default_scheduler_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// IANA timezone name trigger times are interpreted in. Schedules are
    /// wall-clock local to the business, not to wherever the process runs.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_scheduler_poll_interval_secs(),
            timezone: default_timezone(),
        }
    }
}

fn default_scheduler_poll_interval_secs() -> u64 {
    60
}

fn default_timezone() -> String {
    "UTC".to_string()
}
