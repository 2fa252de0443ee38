// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-side workers for the Corvo messaging assistant.
//!
//! Three independent timer loops run against the durable store, decoupled
//! from inbound traffic:
//!
//! - [`ResponseQueueWorker`] delivers pre-scheduled responses with
//!   typing-indicator simulation
//! - [`BroadcastWorker`] runs bulk-send jobs against the subscriber set
//! - [`TriggerScheduler`] turns daily wall-clock rules into broadcast jobs
//!
//! Each worker owns the rows it mutates at that moment (a claimed job, a
//! queue item being delivered), so no locking beyond the database's atomic
//! updates is needed.

pub mod broadcast;
pub mod responses;
pub mod scheduler;

pub use broadcast::BroadcastWorker;
pub use responses::ResponseQueueWorker;
pub use scheduler::TriggerScheduler;
