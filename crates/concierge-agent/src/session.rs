// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, TTL-expiring short-term message buffers keyed by session id.
//!
//! [`SessionMemory`] is a pure in-memory cache: it bounds how much history a
//! prompt carries and forgets idle sessions. It is not a system of record.
//! Buffers are held in a [`DashMap`] so turns for different sessions can read
//! and append concurrently; the sweeper only ever removes whole buffers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use concierge_config::model::SessionConfig;
use concierge_core::types::Message;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct SessionBuffer {
    messages: VecDeque<Message>,
    touched: Instant,
}

/// Per-session message buffers with a size cap and an idle TTL.
pub struct SessionMemory {
    buffers: DashMap<String, SessionBuffer>,
    max_messages: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionMemory {
    pub fn new(max_messages: usize, ttl: Duration) -> Self {
        Self::with_clock(max_messages, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(max_messages: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            buffers: DashMap::new(),
            max_messages: max_messages.max(1),
            ttl,
            clock,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_messages, Duration::from_secs(config.ttl_secs))
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, buffer: &SessionBuffer, now: Instant) -> bool {
        now.saturating_duration_since(buffer.touched) > self.ttl
    }

    /// Messages of a live session, oldest first; empty if unknown or expired.
    pub fn get(&self, session_id: &str) -> Vec<Message> {
        let now = self.clock.now();
        match self.buffers.get(session_id) {
            Some(buffer) if !self.is_expired(&buffer, now) => buffer.messages.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Appends a message, trimming to the newest `max_messages` and
    /// refreshing the touch timestamp. An expired buffer starts over.
    pub fn append(&self, session_id: &str, message: Message) {
        let now = self.clock.now();
        let mut buffer = self
            .buffers
            .entry(session_id.to_string())
            .or_insert_with(|| SessionBuffer {
                messages: VecDeque::new(),
                touched: now,
            });
        if self.is_expired(&buffer, now) {
            buffer.messages.clear();
        }
        buffer.messages.push_back(message);
        while buffer.messages.len() > self.max_messages {
            buffer.messages.pop_front();
        }
        buffer.touched = now;
    }

    /// Replaces a session's buffer with the newest `max_messages` of `messages`.
    ///
    /// Used to rehydrate a session from a persisted conversation.
    pub fn seed(&self, session_id: &str, messages: &[Message]) {
        let start = messages.len().saturating_sub(self.max_messages);
        let buffer = SessionBuffer {
            messages: messages[start..].iter().cloned().collect(),
            touched: self.clock.now(),
        };
        self.buffers.insert(session_id.to_string(), buffer);
    }

    /// Whether a live (unexpired) buffer exists.
    pub fn contains(&self, session_id: &str) -> bool {
        let now = self.clock.now();
        self.buffers
            .get(session_id)
            .is_some_and(|b| !self.is_expired(&b, now))
    }

    /// Number of buffers held, expired or not.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Removes every buffer idle for longer than the TTL. Returns how many.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.buffers.len();
        self.buffers.retain(|_, buffer| !self.is_expired(buffer, now));
        let removed = before.saturating_sub(self.buffers.len());
        if removed > 0 {
            debug!(removed, remaining = self.buffers.len(), "expired sessions swept");
        }
        removed
    }

    /// Runs [`sweep`](Self::sweep) every `interval` until `cancel` fires.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let memory = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip the first immediate tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        memory.sweep();
                    }
                    _ = cancel.cancelled() => {
                        info!("session sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }
}
