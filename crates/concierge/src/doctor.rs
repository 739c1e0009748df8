// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge doctor` command implementation.
//!
//! Runs diagnostic checks against the configured chat provider, embedding
//! endpoint, web lookup and corpus files.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use concierge_config::ConciergeConfig;
use concierge_core::ConciergeError;
use concierge_core::traits::PluginAdapter;
use concierge_core::types::HealthStatus;

use crate::bootstrap;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `concierge doctor` command. With `plain`, disables colored output.
pub async fn run_doctor(config: &ConciergeConfig, plain: bool) -> Result<(), ConciergeError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let stack = bootstrap::build(config).await?;

    let mut results = vec![check_credentials(config)];
    results.push(check_adapter("Chat provider", stack.provider.as_ref()).await);
    results.push(check_adapter("Embeddings", stack.embedder.as_ref()).await);
    results.push(match &stack.lookup {
        Some(lookup) => check_adapter("Web lookup", lookup.as_ref()).await,
        None => CheckResult::new("Web lookup", CheckStatus::Pass, "disabled", Instant::now()),
    });
    results.push(check_corpus(
        "Records",
        stack.records.len(),
        stack.records.iter().filter(|e| e.embedding.is_some()).count(),
    ));
    results.push(check_corpus(
        "Grounding",
        stack.grounding.len(),
        stack.grounding.iter().filter(|e| e.embedding.is_some()).count(),
    ));
    results.push(check_memory_baseline());

    println!();
    println!("  concierge doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", render_line(result, use_color));
    }
    println!();

    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!("    {symbol} {:<16} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<16} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Warns when no chat provider key is available.
fn check_credentials(config: &ConciergeConfig) -> CheckResult {
    let start = Instant::now();
    let configured = config.provider.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
        || std::env::var("OPENROUTER_API_KEY").is_ok_and(|k| !k.trim().is_empty());
    if configured {
        CheckResult::new("Credentials", CheckStatus::Pass, "provider key set", start)
    } else {
        CheckResult::new(
            "Credentials",
            CheckStatus::Warn,
            "no provider key (set provider.api_key or OPENROUTER_API_KEY)",
            start,
        )
    }
}

async fn check_adapter(name: &str, adapter: &dyn PluginAdapter) -> CheckResult {
    let start = Instant::now();
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(name, CheckStatus::Pass, "reachable", start),
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new(name, CheckStatus::Warn, format!("degraded: {reason}"), start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => CheckResult::new(name, CheckStatus::Fail, reason, start),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

fn check_corpus(name: &str, entries: usize, with_vectors: usize) -> CheckResult {
    let start = Instant::now();
    if entries == 0 {
        return CheckResult::new(name, CheckStatus::Warn, "empty or missing", start);
    }
    let message = format!("{entries} entries, {with_vectors} with vectors");
    if with_vectors == 0 {
        CheckResult::new(name, CheckStatus::Warn, message, start)
    } else {
        CheckResult::new(name, CheckStatus::Pass, message, start)
    }
}

fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        let allocated_mb = allocated as f64 / (1024.0 * 1024.0);
        let resident_mb = resident as f64 / (1024.0 * 1024.0);
        CheckResult::new(
            "Memory",
            CheckStatus::Pass,
            format!("heap: {allocated_mb:.1} MB, resident: {resident_mb:.1} MB"),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::new("Memory", CheckStatus::Warn, "jemalloc not available on MSVC", start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_test_utils::MockEmbedder;

    #[test]
    fn empty_corpus_warns() {
        assert_eq!(check_corpus("Records", 0, 0).status, CheckStatus::Warn);
        assert_eq!(check_corpus("Records", 3, 0).status, CheckStatus::Warn);
        let ok = check_corpus("Records", 3, 2);
        assert_eq!(ok.status, CheckStatus::Pass);
        assert_eq!(ok.message, "3 entries, 2 with vectors");
    }

    #[test]
    fn configured_key_passes() {
        let mut config = ConciergeConfig::default();
        config.provider.api_key = Some("sk-test".into());
        assert_eq!(check_credentials(&config).status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn healthy_adapter_passes() {
        let embedder = MockEmbedder::new(vec![1.0]);
        let result = check_adapter("Embeddings", &embedder).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.name, "Embeddings");
    }

    #[test]
    fn plain_lines_are_tagged() {
        let result = CheckResult {
            name: "Records".into(),
            status: CheckStatus::Warn,
            message: "empty or missing".into(),
            duration: Duration::from_millis(3),
        };
        let line = render_line(&result, false);
        assert!(line.contains("[WARN]"));
        assert!(line.ends_with("empty or missing (3ms)"));
    }

    #[test]
    fn memory_check_reports() {
        let result = check_memory_baseline();
        assert!(result.status == CheckStatus::Pass || result.status == CheckStatus::Warn);
    }
}
