// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 escaping for the Telegram Bot API.
//!
//! Telegram's MarkdownV2 parse mode requires escaping 18 special
//! characters. Corvo replies are conversational prose rather than rendered
//! markdown, so everything is escaped uniformly; if Telegram still rejects
//! the result, the send path falls back to plain text.

/// Characters that must be escaped in MarkdownV2.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes text for Telegram MarkdownV2 parse mode.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if SPECIAL_CHARS.contains(&ch) {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(escape_markdown_v2("Hello world"), "Hello world");
        assert_eq!(escape_markdown_v2(""), "");
    }

    #[test]
    fn punctuation_is_escaped() {
        assert_eq!(escape_markdown_v2("Hello!"), "Hello\\!");
        assert_eq!(escape_markdown_v2("See you at 9.30"), "See you at 9\\.30");
    }

    #[test]
    fn every_special_character_is_escaped() {
        let input = "_*[]()~`>#+-=|{}.!";
        let escaped = escape_markdown_v2(input);
        assert_eq!(escaped.len(), input.len() * 2);
        assert!(escaped.chars().step_by(2).all(|c| c == '\\'));
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(escape_markdown_v2("привет. 😀"), "привет\\. 😀");
    }
}
