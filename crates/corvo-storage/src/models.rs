// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `corvo-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use corvo_core::types::{
    BroadcastJob, ConversationTurn, JobStatus, PendingResponse, ResponseStatus, ScheduledTrigger,
    Subscriber, TurnRole,
};
