// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Concierge integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock language model with a scripted response queue
//! - [`MockEmbedder`] - Mock embedding adapter with keyword-routed vectors
//! - [`ManualClock`] - Clock for session expiry tests
//! - [`TestHarness`] - Complete chat service over the mocks

pub mod clock;
pub mod harness;
pub mod mock_embedder;
pub mod mock_provider;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder, classification_json, reply_json};
pub use mock_embedder::MockEmbedder;
pub use mock_provider::MockProvider;
