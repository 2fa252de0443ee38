// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned-answer lookup trait for the FAQ short-circuit.

use async_trait::async_trait;

use crate::error::CorvoError;

/// External FAQ / semantic-match lookup consulted before response generation.
///
/// A `Some` result is sent to the user verbatim and generation is skipped.
#[async_trait]
pub trait FaqMatcher: Send + Sync + 'static {
    /// Looks up a canned answer for the given user utterance.
    async fn lookup(&self, question: &str) -> Result<Option<String>, CorvoError>;
}
