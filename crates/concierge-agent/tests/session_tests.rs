// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session memory bounds and expiry, driven by a manual clock.

use std::sync::Arc;
use std::time::Duration;

use concierge_agent::SessionMemory;
use concierge_core::types::Message;
use concierge_test_utils::ManualClock;
use tokio_util::sync::CancellationToken;

fn memory(clock: &Arc<ManualClock>) -> Arc<SessionMemory> {
    Arc::new(SessionMemory::with_clock(
        20,
        Duration::from_secs(900),
        clock.clone(),
    ))
}

#[test]
fn twenty_five_appends_keep_last_twenty_in_order() {
    let clock = Arc::new(ManualClock::new());
    let memory = memory(&clock);
    for i in 0..25 {
        memory.append("session", Message::user(format!("message {i}")));
    }

    let contents: Vec<String> = memory
        .get("session")
        .into_iter()
        .map(|m| m.content)
        .collect();
    let expected: Vec<String> = (5..25).map(|i| format!("message {i}")).collect();
    assert_eq!(contents, expected);
}

#[test]
fn idle_buffer_is_gone_after_sweep() {
    let clock = Arc::new(ManualClock::new());
    let memory = memory(&clock);
    memory.append("idle", Message::user("hello"));

    clock.advance(Duration::from_secs(901));
    assert_eq!(memory.sweep(), 1);
    assert!(memory.get("idle").is_empty());
    assert!(memory.is_empty());
}

#[test]
fn touching_a_session_keeps_it_alive() {
    let clock = Arc::new(ManualClock::new());
    let memory = memory(&clock);
    memory.append("active", Message::user("one"));
    clock.advance(Duration::from_secs(600));
    memory.append("active", Message::assistant("two"));
    clock.advance(Duration::from_secs(600));

    assert_eq!(memory.sweep(), 0);
    assert_eq!(memory.get("active").len(), 2);
}

#[test]
fn sessions_are_independent() {
    let clock = Arc::new(ManualClock::new());
    let memory = memory(&clock);
    memory.append("a", Message::user("for a"));
    memory.append("b", Message::user("for b"));
    assert_eq!(memory.get("a")[0].content, "for a");
    assert_eq!(memory.get("b")[0].content, "for b");
    assert_eq!(memory.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn background_sweeper_removes_expired_buffers() {
    let clock = Arc::new(ManualClock::new());
    let memory = memory(&clock);
    let cancel = CancellationToken::new();
    let handle = memory.spawn_sweeper(Duration::from_secs(60), cancel.clone());

    memory.append("idle", Message::user("hello"));
    clock.advance(Duration::from_secs(901));
    assert_eq!(memory.len(), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(memory.len(), 0);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn concurrent_appends_to_different_sessions() {
    let clock = Arc::new(ManualClock::new());
    let memory = memory(&clock);

    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let memory = memory.clone();
            tokio::spawn(async move {
                for i in 0..10 {
                    memory.append(&format!("s{n}"), Message::user(format!("{i}")));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    for n in 0..8 {
        assert_eq!(memory.get(&format!("s{n}")).len(), 10);
    }
}
