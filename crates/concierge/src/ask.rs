// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge ask` command implementation.

use concierge_agent::{ChatService, TurnRequest, TurnResponse};
use concierge_config::ConciergeConfig;
use concierge_core::ConciergeError;

use crate::bootstrap;
use crate::shell::render_reply;

/// Answers one message in a fresh conversation and prints the reply.
pub async fn run_ask(config: &ConciergeConfig, message: &str, json: bool) -> Result<(), ConciergeError> {
    let stack = bootstrap::build(config).await?;
    let response = ask(&stack.service, message).await?;

    if json {
        let body = serde_json::to_string_pretty(&response)
            .map_err(|e| ConciergeError::Internal(format!("failed to encode response: {e}")))?;
        println!("{body}");
    } else {
        println!("{}", render_reply(&response.reply, false));
    }
    Ok(())
}

async fn ask(service: &ChatService, message: &str) -> Result<TurnResponse, ConciergeError> {
    let request = TurnRequest::new(message).from_user("cli");
    Ok(service.handle_turn(request, None).await?.response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_test_utils::{TestHarness, classification_json, reply_json};

    #[tokio::test]
    async fn answers_in_new_conversation() {
        let harness = TestHarness::builder()
            .with_mock_responses([
                classification_json("politeness", "en"),
                reply_json("Hello!", &["Show listings"]),
            ])
            .build();

        let response = ask(&harness.service, "Hi").await.unwrap();
        assert_eq!(response.user_id, "cli");
        assert_eq!(response.reply.reply, "Hello!");
    }

    #[tokio::test]
    async fn blank_message_is_an_error() {
        let harness = TestHarness::builder().build();
        let err = ask(&harness.service, " ").await.unwrap_err();
        assert!(err.is_caller_error());
    }
}
