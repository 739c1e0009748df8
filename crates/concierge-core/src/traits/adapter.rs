// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by every external collaborator.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, lifecycle, and health reporting for an adapter.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Human-readable adapter name, used in logs and `doctor` output.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Checks the remote service without side effects.
    async fn health_check(&self) -> Result<HealthStatus, ConciergeError>;

    /// Releases held resources. Most HTTP adapters have nothing to release.
    async fn shutdown(&self) -> Result<(), ConciergeError> {
        Ok(())
    }
}
