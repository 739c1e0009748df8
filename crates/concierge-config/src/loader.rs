// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/concierge/concierge.toml`
//! 3. `~/.config/concierge/concierge.toml`
//! 4. `./concierge.toml`
//! 5. `CONCIERGE_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ConciergeConfig;

/// File name looked up in each config directory.
pub const CONFIG_FILE_NAME: &str = "concierge.toml";

/// Section names recognized in `CONCIERGE_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "provider",
    "classifier",
    "embedding",
    "retrieval",
    "session",
    "reply",
    "lookup",
];

/// Loads configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<ConciergeConfig, figment::Error> {
    build_figment().extract()
}

/// Loads configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<ConciergeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads configuration from one explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConciergeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Returns the config files consulted by [`load_config`], lowest priority first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/concierge").join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("concierge").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

/// Builds the full Figment before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(ConciergeConfig::default()));
    for path in search_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Maps `CONCIERGE_PROVIDER_API_KEY` to `provider.api_key`.
///
/// Only the leading section name is split off, so keys that themselves
/// contain underscores (`reply_max_tokens`) stay intact.
fn env_provider() -> Env {
    Env::prefixed("CONCIERGE_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
