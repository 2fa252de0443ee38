// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./corvo.toml` > `~/.config/corvo/corvo.toml` > `/etc/corvo/corvo.toml`
//! with environment variable overrides via `CORVO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CorvoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/corvo/corvo.toml` (system-wide)
/// 3. `~/.config/corvo/corvo.toml` (user XDG config)
/// 4. `./corvo.toml` (local directory)
/// 5. `CORVO_*` environment variables
pub fn load_config() -> Result<CorvoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<CorvoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CorvoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CorvoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CorvoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CorvoConfig::default()))
        .merge(Toml::file("/etc/corvo/corvo.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("corvo/corvo.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("corvo.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CORVO_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("CORVO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CORVO_TELEGRAM_BOT_TOKEN -> "telegram_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("anthropic_", "anthropic.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("aggregator_", "aggregator.", 1)
            .replacen("dispatcher_", "dispatcher.", 1)
            .replacen("delivery_", "delivery.", 1)
            .replacen("broadcast_", "broadcast.", 1)
            .replacen("scheduler_", "scheduler.", 1);
        mapped.into()
    })
}
