// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Concierge assistant.
//!
//! TOML files are layered with environment overrides, unknown keys are
//! rejected with typo suggestions, and semantic validation collects every
//! problem before startup continues.
//!
//! # Usage
//!
//! ```no_run
//! use concierge_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("chat model: {}", config.provider.chat_model);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{ConciergeConfig, EmbeddingApi, SummaryPolicy};

/// Loads from the standard hierarchy and validates.
pub fn load_and_validate() -> Result<ConciergeConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Loads one explicit file (plus env overrides) and validates.
pub fn load_and_validate_path(path: &Path) -> Result<ConciergeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Loads an inline TOML string and validates.
pub fn load_and_validate_str(toml_content: &str) -> Result<ConciergeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<ConciergeConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ConciergeConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Reads every existing config file so diagnostics can point into it.
fn collect_toml_sources() -> Vec<(String, String)> {
    loader::search_paths()
        .iter()
        .filter_map(|path| read_source(path))
        .collect()
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Some((absolute.display().to_string(), content))
}
