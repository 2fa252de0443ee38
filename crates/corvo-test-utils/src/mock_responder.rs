// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock responder adapter for deterministic testing.
//!
//! `MockResponder` implements `ResponderAdapter` with pre-configured
//! replies, enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use corvo_core::traits::adapter::PluginAdapter;
use corvo_core::traits::responder::ResponderAdapter;
use corvo_core::types::{AdapterType, GenerateRequest, GeneratedReply, HealthStatus};
use corvo_core::CorvoError;

/// A mock responder that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a default
/// "mock reply" text is returned. All received requests are captured for
/// assertion.
pub struct MockResponder {
    replies: Arc<Mutex<VecDeque<GeneratedReply>>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockResponder {
    /// Create a new mock responder with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock responder pre-loaded with text replies.
    pub fn with_replies(texts: Vec<String>) -> Self {
        let replies = texts
            .into_iter()
            .map(|text| GeneratedReply {
                text: Some(text),
                reaction: None,
            })
            .collect();
        Self {
            replies: Arc::new(Mutex::new(replies)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: GeneratedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockResponder {
    fn name(&self) -> &str {
        "mock-responder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, CorvoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CorvoError> {
        Ok(())
    }
}

#[async_trait]
impl ResponderAdapter for MockResponder {
    async fn generate(&self, request: GenerateRequest) -> Result<GeneratedReply, CorvoError> {
        self.requests.lock().await.push(request);
        let reply = self.replies.lock().await.pop_front().unwrap_or(GeneratedReply {
            text: Some("mock reply".to_string()),
            reaction: None,
        });
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use corvo_core::types::{now_rfc3339, ConversationTurn, TurnRole};

    fn make_request(content: &str) -> GenerateRequest {
        GenerateRequest {
            chat_id: "chat-1".into(),
            history: vec![ConversationTurn {
                id: 0,
                chat_id: "chat-1".into(),
                role: TurnRole::User,
                content: content.to_string(),
                attachment_refs: vec![],
                created_at: now_rfc3339(),
            }],
            attachments: vec![],
            privileged: false,
        }
    }

    #[tokio::test]
    async fn replies_pop_in_order_then_default() {
        let responder = MockResponder::with_replies(vec!["one".into(), "two".into()]);

        let r1 = responder.generate(make_request("a")).await.unwrap();
        let r2 = responder.generate(make_request("b")).await.unwrap();
        let r3 = responder.generate(make_request("c")).await.unwrap();

        assert_eq!(r1.text.as_deref(), Some("one"));
        assert_eq!(r2.text.as_deref(), Some("two"));
        assert_eq!(r3.text.as_deref(), Some("mock reply"));
    }

    #[tokio::test]
    async fn requests_are_captured() {
        let responder = MockResponder::new();
        responder.generate(make_request("hello")).await.unwrap();

        let requests = responder.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].history[0].content, "hello");
    }

    #[tokio::test]
    async fn reaction_replies_pass_through() {
        let responder = MockResponder::new();
        responder
            .add_reply(GeneratedReply {
                text: None,
                reaction: Some("👍".into()),
            })
            .await;

        let reply = responder.generate(make_request("thanks")).await.unwrap();
        assert!(reply.text.is_none());
        assert_eq!(reply.reaction.as_deref(), Some("👍"));
    }
}
