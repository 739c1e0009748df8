// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped timeout plus single-fallback wrapper for external calls.
//!
//! Every call to a language model, embedding provider, or lookup service
//! goes through [`guarded`], so the time budget and the degrade-to-fallback
//! policy live in one place.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::ConciergeError;

/// Runs `future` with a time limit, mapping expiry to [`ConciergeError::Timeout`].
pub async fn with_timeout<T, F>(
    operation: &str,
    limit: Duration,
    future: F,
) -> Result<T, ConciergeError>
where
    F: Future<Output = Result<T, ConciergeError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(ConciergeError::Timeout {
            operation: operation.to_string(),
            duration: limit,
        }),
    }
}

/// Runs `future` with a time limit and returns `fallback()` on error or timeout.
///
/// The absorbed error is logged at `warn` with the operation name.
pub async fn guarded<T, F, D>(operation: &str, limit: Duration, future: F, fallback: D) -> T
where
    F: Future<Output = Result<T, ConciergeError>>,
    D: FnOnce() -> T,
{
    let started = Instant::now();
    match with_timeout(operation, limit, future).await {
        Ok(value) => {
            debug!(
                operation,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "external call completed"
            );
            value
        }
        Err(e) => {
            warn!(
                operation,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "external call failed, using fallback"
            );
            fallback()
        }
    }
}
