// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Corvo messaging assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Corvo workspace. The aggregation
//! pipeline, delivery workers, and channel/responder adapters all build on
//! the contracts defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CorvoError;
pub use types::{AdapterType, HealthStatus, MessageId};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, FaqMatcher, PluginAdapter, ResponderAdapter, StorageAdapter};
