// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Responder adapter trait for the response generation collaborator.

use async_trait::async_trait;

use crate::error::CorvoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{GenerateRequest, GeneratedReply};

/// Adapter for response generation.
///
/// Given a conversation history and optional attachment references, produces
/// a reply and/or an emoji reaction. Calls are expected to have bounded
/// latency; the dispatcher additionally wraps them in a timeout.
#[async_trait]
pub trait ResponderAdapter: PluginAdapter {
    /// Generates a reply for the given request.
    ///
    /// A reply with neither text nor reaction means "stay silent".
    async fn generate(&self, request: GenerateRequest) -> Result<GeneratedReply, CorvoError>;
}
