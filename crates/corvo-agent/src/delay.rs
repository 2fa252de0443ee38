// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Debounce delay policy for text aggregation.
//!
//! Short fragments ("ok", "and") are likely to be followed by more typing,
//! so they wait longest; long messages are likely complete thoughts and wait
//! least. The mapping is a total, deterministic, pure function of the text
//! length.

use std::time::Duration;

use corvo_config::model::AggregatorConfig;

/// Compute the debounce delay for an inbound text fragment.
pub fn reply_delay(text: &str, config: &AggregatorConfig) -> Duration {
    let len = text.chars().count();
    let ms = if len < config.short_max_chars {
        config.short_delay_ms
    } else if len < config.medium_max_chars {
        config.medium_delay_ms
    } else {
        config.long_delay_ms
    };
    Duration::from_millis(ms)
}
