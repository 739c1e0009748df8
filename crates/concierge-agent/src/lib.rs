// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply orchestration and session handling for the Concierge assistant.
//!
//! The [`ChatService`] is the entry point for a chat turn:
//! - Validates the inbound [`TurnRequest`]
//! - Creates or resumes the conversation and its [`SessionMemory`] window
//! - Runs the [`Orchestrator`]: classify, route, retrieve, generate, repair
//! - Returns the [`TurnResponse`] plus the mutated conversation to persist

pub mod orchestrator;
pub mod service;
pub mod session;
pub mod slots;

pub use orchestrator::{Orchestrator, ReplySettings, TurnReport};
pub use service::{ChatService, TurnOutcome, TurnRequest, TurnResponse};
pub use session::{Clock, SessionMemory, SystemClock};
