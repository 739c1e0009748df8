// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the external collaborators of the reply pipeline.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so they can be held as `Arc<dyn ...>`.

pub mod adapter;
pub mod embedding;
pub mod lookup;
pub mod provider;

pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use lookup::LookupAdapter;
pub use provider::ProviderAdapter;
