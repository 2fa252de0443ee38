// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock FAQ matcher for testing the dispatcher's short-circuit path.

use async_trait::async_trait;

use corvo_core::traits::faq::FaqMatcher;
use corvo_core::CorvoError;

/// A FAQ matcher backed by a fixed list of (pattern, answer) pairs.
///
/// The first pattern contained case-insensitively in the question wins.
pub struct MockFaq {
    entries: Vec<(String, String)>,
}

impl MockFaq {
    /// Create a matcher from (pattern, answer) pairs.
    pub fn with_entries(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl FaqMatcher for MockFaq {
    async fn lookup(&self, question: &str) -> Result<Option<String>, CorvoError> {
        let question = question.to_lowercase();
        for (pattern, answer) in &self.entries {
            if question.contains(&pattern.to_lowercase()) {
                return Ok(Some(answer.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_matching_pattern_wins() {
        let faq = MockFaq::with_entries(vec![
            ("hours".into(), "9-17".into()),
            ("price".into(), "call us".into()),
        ]);

        assert_eq!(
            faq.lookup("what are your HOURS?").await.unwrap().as_deref(),
            Some("9-17")
        );
        assert_eq!(
            faq.lookup("price list please").await.unwrap().as_deref(),
            Some("call us")
        );
        assert!(faq.lookup("unrelated").await.unwrap().is_none());
    }
}
