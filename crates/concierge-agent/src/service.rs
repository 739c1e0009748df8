// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inbound/outbound turn contract.

use std::sync::Arc;
use std::time::Duration;

use concierge_core::error::ConciergeError;
use concierge_core::types::{Conversation, Message, StructuredReply};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::orchestrator::{Orchestrator, TurnReport};
use crate::session::SessionMemory;

/// An inbound chat turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn from_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// The reply handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    #[serde(flatten)]
    pub reply: StructuredReply,
    pub conversation_id: String,
    pub user_id: String,
}

/// Result of [`ChatService::handle_turn`].
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: TurnResponse,
    /// The mutated conversation, for the caller to persist.
    pub conversation: Conversation,
}

/// Handles chat turns against session memory and the orchestrator.
pub struct ChatService {
    orchestrator: Orchestrator,
    sessions: Arc<SessionMemory>,
}

impl ChatService {
    pub fn new(orchestrator: Orchestrator, sessions: Arc<SessionMemory>) -> Self {
        Self {
            orchestrator,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionMemory> {
        &self.sessions
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Runs one turn.
    ///
    /// `existing` is the stored conversation for `request.conversation_id`,
    /// if the caller has one. Without it a new conversation is created,
    /// reusing the requested id when one was given. A blank message is
    /// rejected with [`ConciergeError::InvalidInput`] before any external
    /// call; every other failure degrades inside the turn.
    ///
    /// Turns for the same conversation are not serialized. Two concurrent
    /// turns on one id each start from the same stored conversation, and
    /// whichever the caller persists last wins.
    pub async fn handle_turn(
        &self,
        request: TurnRequest,
        existing: Option<Conversation>,
    ) -> Result<TurnOutcome, ConciergeError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ConciergeError::invalid_input("message is required"));
        }

        let mut conversation = match existing {
            Some(conversation) => {
                if let Some(requested) = request.conversation_id.as_deref() {
                    if requested != conversation.id {
                        warn!(requested, stored = %conversation.id, "conversation id mismatch, using stored conversation");
                    }
                }
                conversation
            }
            None => self.start_conversation(&request),
        };

        let history = self.history_for(&conversation);
        let TurnReport { reply, .. } = self
            .orchestrator
            .respond(&mut conversation, &history, message)
            .await;

        for appended in conversation.tail(2) {
            self.sessions.append(&conversation.id, appended.clone());
        }

        Ok(TurnOutcome {
            response: TurnResponse {
                reply,
                conversation_id: conversation.id.clone(),
                user_id: conversation.user_id.clone(),
            },
            conversation,
        })
    }

    /// Self-introduction for a fresh session.
    pub async fn introduce(&self, language: &str) -> StructuredReply {
        self.orchestrator.introduce(language).await
    }

    /// Starts the periodic session sweep; stops when `cancel` fires.
    pub fn spawn_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        self.sessions.spawn_sweeper(interval, cancel)
    }

    fn start_conversation(&self, request: &TurnRequest) -> Conversation {
        let user_id = request
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("anon-{}", uuid::Uuid::new_v4()));
        let mut conversation = Conversation::new(user_id, &self.orchestrator.settings().persona);
        if let Some(id) = request.conversation_id.as_deref().filter(|id| !id.trim().is_empty()) {
            conversation.id = id.to_string();
        }
        debug!(conversation_id = %conversation.id, user_id = %conversation.user_id, "conversation created");
        conversation
    }

    /// Live session window, or the conversation's tail when the session is
    /// unknown or expired.
    fn history_for(&self, conversation: &Conversation) -> Vec<Message> {
        let history = self.sessions.get(&conversation.id);
        if !history.is_empty() {
            return history;
        }
        self.sessions.seed(
            &conversation.id,
            conversation.tail(self.sessions.max_messages()),
        );
        self.sessions.get(&conversation.id)
    }
}
