// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::ConciergeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates a deserialized configuration, collecting every problem found.
pub fn validate_config(config: &ConciergeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.agent.log_level
        )));
    }

    if config.agent.apology.trim().is_empty() {
        errors.push(ConfigError::validation("agent.apology must not be empty"));
    }

    for (key, url) in [
        ("provider.base_url", &config.provider.base_url),
        ("embedding.base_url", &config.embedding.base_url),
        ("lookup.base_url", &config.lookup.base_url),
    ] {
        if url.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        }
    }

    for (key, model) in [
        ("provider.chat_model", &config.provider.chat_model),
        ("provider.classifier_model", &config.provider.classifier_model),
        ("embedding.model", &config.embedding.model),
    ] {
        if model.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        }
    }

    for (key, temperature) in [
        ("provider.reply_temperature", config.provider.reply_temperature),
        ("provider.domain_temperature", config.provider.domain_temperature),
        ("provider.summary_temperature", config.provider.summary_temperature),
    ] {
        if !(0.0..=2.0).contains(&temperature) {
            errors.push(ConfigError::validation(format!(
                "{key} must be between 0.0 and 2.0, got {temperature}"
            )));
        }
    }

    if !(-1.0..=1.0).contains(&config.retrieval.record_threshold) {
        errors.push(ConfigError::validation(format!(
            "retrieval.record_threshold must be between -1.0 and 1.0, got {}",
            config.retrieval.record_threshold
        )));
    }

    for (key, value) in [
        ("provider.timeout_secs", config.provider.timeout_secs),
        ("embedding.timeout_secs", config.embedding.timeout_secs),
        ("lookup.timeout_secs", config.lookup.timeout_secs),
        ("session.ttl_secs", config.session.ttl_secs),
        ("session.sweep_interval_secs", config.session.sweep_interval_secs),
        ("provider.reply_max_tokens", u64::from(config.provider.reply_max_tokens)),
        ("classifier.max_tokens", u64::from(config.classifier.max_tokens)),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!("{key} must be greater than 0")));
        }
    }

    if config.session.max_messages == 0 {
        errors.push(ConfigError::validation(
            "session.max_messages must be greater than 0",
        ));
    }

    if config.lookup.enabled {
        if config.lookup.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            errors.push(ConfigError::validation(
                "lookup.api_key is required when lookup.enabled = true",
            ));
        }
        if config.lookup.engine_id.as_deref().is_none_or(|k| k.trim().is_empty()) {
            errors.push(ConfigError::validation(
                "lookup.engine_id is required when lookup.enabled = true",
            ));
        }
        // The search API caps a single page at 10 results.
        if !(1..=10).contains(&config.lookup.max_results) {
            errors.push(ConfigError::validation(format!(
                "lookup.max_results must be between 1 and 10, got {}",
                config.lookup.max_results
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &ConciergeConfig) -> Vec<String> {
        match validate_config(config) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ConciergeConfig::default()).is_ok());
    }

    #[test]
    fn threshold_out_of_range() {
        let mut config = ConciergeConfig::default();
        config.retrieval.record_threshold = 1.5;
        let errors = messages(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("retrieval.record_threshold"));
    }

    #[test]
    fn zero_capacity_and_intervals_rejected() {
        let mut config = ConciergeConfig::default();
        config.session.max_messages = 0;
        config.session.sweep_interval_secs = 0;
        config.embedding.timeout_secs = 0;
        let errors = messages(&config);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn enabled_lookup_requires_credentials() {
        let mut config = ConciergeConfig::default();
        config.lookup.enabled = true;
        let errors = messages(&config);
        assert!(errors.iter().any(|e| e.contains("lookup.api_key")));
        assert!(errors.iter().any(|e| e.contains("lookup.engine_id")));

        config.lookup.api_key = Some("key".into());
        config.lookup.engine_id = Some("cx".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut config = ConciergeConfig::default();
        config.agent.log_level = "loud".into();
        let errors = messages(&config);
        assert!(errors[0].contains("agent.log_level"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ConciergeConfig::default();
        config.provider.base_url = " ".into();
        config.provider.reply_temperature = 3.0;
        config.agent.apology = String::new();
        assert_eq!(messages(&config).len(), 3);
    }
}
