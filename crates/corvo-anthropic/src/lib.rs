// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic responder adapter for the Corvo messaging assistant.
//!
//! Implements [`ResponderAdapter`] over the non-streaming Messages API.
//! Conversation turns map to alternating API messages; attachment
//! references are appended to the final user message as a bracketed list
//! (the responder treats them as opaque identifiers).

pub mod client;
pub mod types;

use async_trait::async_trait;
use corvo_config::model::AnthropicConfig;
use corvo_core::traits::{PluginAdapter, ResponderAdapter};
use corvo_core::types::{
    AdapterType, ConversationTurn, GenerateRequest, GeneratedReply, HealthStatus, TurnRole,
};
use corvo_core::CorvoError;
use tracing::debug;

pub use client::AnthropicClient;
use types::{ApiMessage, MessageRequest};

/// Responder backed by the Anthropic Messages API.
pub struct AnthropicResponder {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
    system_prompt: Option<String>,
}

impl AnthropicResponder {
    /// Creates the responder from configuration.
    ///
    /// The API key comes from `anthropic.api_key` or the `ANTHROPIC_API_KEY`
    /// environment variable.
    pub fn new(config: &AnthropicConfig) -> Result<Self, CorvoError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                CorvoError::Config(
                    "Anthropic API key required: set anthropic.api_key or ANTHROPIC_API_KEY".into(),
                )
            })?;

        let client = AnthropicClient::new(api_key, config.api_version.clone())?;

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        })
    }

    fn build_request(&self, request: &GenerateRequest) -> MessageRequest {
        let mut messages = collapse_turns(&request.history);

        // Attachment references ride along on the final user message.
        if !request.attachments.is_empty()
            && let Some(last) = messages.last_mut()
            && last.role == "user"
        {
            last.content
                .push_str(&format!("\n[attachments: {}]", request.attachments.join(", ")));
        }

        MessageRequest {
            model: self.model.clone(),
            messages,
            system: self.system_prompt.clone(),
            max_tokens: self.max_tokens,
            stream: false,
        }
    }
}

/// Map conversation turns to API messages, merging consecutive same-role
/// turns (the Messages API requires alternating roles).
fn collapse_turns(history: &[ConversationTurn]) -> Vec<ApiMessage> {
    let mut messages: Vec<ApiMessage> = Vec::new();

    for turn in history {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        };
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push('\n');
                last.content.push_str(&turn.content);
            }
            _ => messages.push(ApiMessage {
                role: role.to_string(),
                content: turn.content.clone(),
            }),
        }
    }

    messages
}

#[async_trait]
impl PluginAdapter for AnthropicResponder {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, CorvoError> {
        // No side-effect-free ping endpoint; a constructed client is healthy.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CorvoError> {
        Ok(())
    }
}

#[async_trait]
impl ResponderAdapter for AnthropicResponder {
    async fn generate(&self, request: GenerateRequest) -> Result<GeneratedReply, CorvoError> {
        let api_request = self.build_request(&request);
        let response = self.client.complete_message(&api_request).await?;

        let text = response.text();
        debug!(
            chat_id = request.chat_id.as_str(),
            output_tokens = response.usage.output_tokens,
            "generation completed"
        );

        Ok(GeneratedReply {
            text: if text.trim().is_empty() { None } else { Some(text) },
            reaction: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use corvo_core::types::now_rfc3339;

    use super::*;

    fn turn(role: TurnRole, content: &str) -> ConversationTurn {
        ConversationTurn {
            id: 0,
            chat_id: "c".into(),
            role,
            content: content.to_string(),
            attachment_refs: vec![],
            created_at: now_rfc3339(),
        }
    }

    #[test]
    fn collapse_merges_consecutive_same_role_turns() {
        let history = vec![
            turn(TurnRole::User, "hi"),
            turn(TurnRole::User, "are you there?"),
            turn(TurnRole::Assistant, "yes"),
            turn(TurnRole::User, "good"),
        ];
        let messages = collapse_turns(&history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hi\nare you there?");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].content, "good");
    }

    #[test]
    fn build_request_appends_attachments_to_last_user_message() {
        let responder = AnthropicResponder {
            client: AnthropicClient::new("k".into(), "2023-06-01".into()).unwrap(),
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 256,
            system_prompt: Some("Be brief.".into()),
        };

        let request = GenerateRequest {
            chat_id: "c".into(),
            history: vec![turn(TurnRole::User, "see these")],
            attachments: vec!["p1".into(), "d1#page=1".into()],
            privileged: false,
        };

        let api_request = responder.build_request(&request);
        assert_eq!(api_request.system.as_deref(), Some("Be brief."));
        assert_eq!(api_request.messages.len(), 1);
        assert!(api_request.messages[0]
            .content
            .ends_with("[attachments: p1, d1#page=1]"));
        assert!(!api_request.stream);
    }

    #[test]
    fn new_without_key_fails() {
        // Ensure the env var is not set in the test environment before
        // asserting; skip quietly if a developer has one exported.
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            return;
        }
        let config = AnthropicConfig::default();
        assert!(matches!(
            AnthropicResponder::new(&config),
            Err(CorvoError::Config(_))
        ));
    }
}
