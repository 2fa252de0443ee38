// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Corvo integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with event injection and side-effect capture
//! - [`MockResponder`] - Mock responder with pre-configured replies
//! - [`MockFaq`] - Fixed-entry FAQ matcher for the dispatcher short-circuit
//! - [`TestHarness`] - Full inbound pipeline wired to the mocks and a temp database

pub mod harness;
pub mod mock_channel;
pub mod mock_faq;
pub mod mock_responder;

pub use harness::TestHarness;
pub use mock_channel::MockChannel;
pub use mock_faq::MockFaq;
pub use mock_responder::MockResponder;
