// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model provider trait.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Sends an ordered message list to a language model and returns its raw text.
///
/// Implementations must not attempt to interpret the output; callers run it
/// through [`crate::repair`].
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    async fn complete(&self, request: ProviderRequest)
    -> Result<ProviderResponse, ConciergeError>;
}
