// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External web lookup trait.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;

/// Fetches short text snippets for a free-form query.
#[async_trait]
pub trait LookupAdapter: PluginAdapter {
    /// Returns at most the adapter's configured number of snippets, best first.
    async fn lookup(&self, query: &str) -> Result<Vec<String>, ConciergeError>;
}
