// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge shell` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline history.
//! The shell plays the persistence collaborator: it keeps the conversation
//! returned by each turn and hands it back on the next one.

use std::time::Duration;

use colored::Colorize;
use concierge_agent::{ChatService, TurnRequest};
use concierge_config::ConciergeConfig;
use concierge_core::ConciergeError;
use concierge_core::types::{Conversation, StructuredReply};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::bootstrap;

/// Runs the `concierge shell` interactive REPL.
pub async fn run_shell(config: &ConciergeConfig, language: &str) -> Result<(), ConciergeError> {
    let stack = bootstrap::build(config).await?;
    let service = stack.service;

    let cancel = CancellationToken::new();
    let sweeper = service.spawn_sweeper(
        Duration::from_secs(config.session.sweep_interval_secs),
        cancel.clone(),
    );

    let mut rl = DefaultEditor::new()
        .map_err(|e| ConciergeError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "concierge shell".bold().green());
    println!(
        "Type {} to exit, {} to start over, {} to see what is known.\n",
        "/quit".yellow(),
        "/reset".yellow(),
        "/slots".yellow()
    );

    let intro = service.introduce(language).await;
    println!("{}\n", render_reply(&intro, true));

    let mut conversation: Option<Conversation> = None;
    let prompt = format!("{}> ", "you".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                match trimmed {
                    "" => continue,
                    "/quit" | "/exit" => break,
                    "/reset" => {
                        conversation = None;
                        println!("{}", "started a new conversation".dimmed());
                        continue;
                    }
                    "/slots" => {
                        println!("{}", render_slots(conversation.as_ref()).dimmed());
                        continue;
                    }
                    _ => {}
                }

                let _ = rl.add_history_entry(&line);
                match turn(&service, trimmed, conversation.take()).await {
                    Ok((updated, reply)) => {
                        println!("{}\n", render_reply(&reply, true));
                        conversation = Some(updated);
                    }
                    Err((previous, e)) => {
                        conversation = previous;
                        eprintln!("{}: {e}", "error".red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    cancel.cancel();
    let _ = sweeper.await;
    if let Some(conversation) = &conversation {
        debug!(conversation_id = %conversation.id, messages = conversation.messages.len(), "shell session ended");
        if !conversation.summary.is_empty() {
            println!("{}", format!("summary: {}", conversation.summary).dimmed());
        }
    }
    Ok(())
}

type TurnResult = Result<(Conversation, StructuredReply), (Option<Conversation>, ConciergeError)>;

async fn turn(service: &ChatService, message: &str, conversation: Option<Conversation>) -> TurnResult {
    let mut request = TurnRequest::new(message).from_user("local");
    if let Some(existing) = &conversation {
        request = request.in_conversation(existing.id.clone());
    }
    let fallback = conversation.clone();
    match service.handle_turn(request, conversation).await {
        Ok(outcome) => Ok((outcome.conversation, outcome.response.reply)),
        Err(e) => Err((fallback, e)),
    }
}

/// Formats a reply and its suggestions for the terminal.
pub fn render_reply(reply: &StructuredReply, color: bool) -> String {
    let mut out = if color {
        format!("{} {}", "concierge>".cyan(), reply.reply)
    } else {
        reply.reply.clone()
    };
    for suggestion in &reply.suggestions {
        let line = format!("  - {suggestion}");
        out.push('\n');
        if color {
            out.push_str(&line.dimmed().to_string());
        } else {
            out.push_str(&line);
        }
    }
    out
}

fn render_slots(conversation: Option<&Conversation>) -> String {
    match conversation {
        Some(c) if !c.slots.is_empty() => c
            .slots
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "nothing known yet".to_string(),
    }
}
