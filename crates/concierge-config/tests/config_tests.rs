// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading and diagnostics.

use concierge_config::diagnostic::ConfigError;
use concierge_config::model::{ConciergeConfig, EmbeddingApi, SummaryPolicy};
use concierge_config::{
    load_and_validate_path, load_and_validate_str, load_config, load_config_from_str,
};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "sasha"
log_level = "debug"
persona = "You are a helpful agent."
apology = "Entschuldigung."

[provider]
base_url = "http://localhost:8080/v1"
api_key = "sk-or-123"
chat_model = "meta-llama/llama-3-8b-instruct"
classifier_model = "openai/gpt-4o-mini"
timeout_secs = 5
reply_temperature = 0.6
domain_temperature = 0.9
reply_max_tokens = 300
summary_temperature = 0.4

[classifier]
max_tokens = 100
bait_filter = false

[embedding]
api = "open-ai"
base_url = "http://localhost:9000/v1"
model = "text-embedding-3-small"
query_prefix = ""
timeout_secs = 3

[retrieval]
record_threshold = 0.6
records_path = "/srv/data/records.json"
grounding_path = "/srv/data/grounding.json"

[session]
max_messages = 10
ttl_secs = 120
sweep_interval_secs = 5

[reply]
summary_policy = "domain_only"

[lookup]
enabled = true
api_key = "g-key"
engine_id = "cx-1"
max_results = 5
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.agent.name, "sasha");
    assert_eq!(config.agent.apology, "Entschuldigung.");
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-or-123"));
    assert_eq!(config.provider.reply_max_tokens, 300);
    assert!(!config.classifier.bait_filter);
    assert_eq!(config.embedding.api, EmbeddingApi::OpenAi);
    assert_eq!(config.embedding.query_prefix, "");
    assert_eq!(config.retrieval.record_threshold, 0.6);
    assert_eq!(
        config.retrieval.records_path.to_str(),
        Some("/srv/data/records.json")
    );
    assert_eq!(config.session.max_messages, 10);
    assert_eq!(config.reply.summary_policy, SummaryPolicy::DomainOnly);
    assert!(config.lookup.enabled);
    assert_eq!(config.lookup.max_results, 5);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config should load");
    assert_eq!(config.agent.name, "concierge");
    assert_eq!(config.provider.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.provider.timeout_secs, 30);
    assert_eq!(config.provider.reply_temperature, 0.7);
    assert_eq!(config.provider.summary_temperature, 0.5);
    assert_eq!(config.classifier.max_tokens, 150);
    assert!(config.classifier.bait_filter);
    assert_eq!(config.embedding.query_prefix, "query: ");
    assert_eq!(config.embedding.api, EmbeddingApi::FeatureExtraction);
    assert_eq!(config.retrieval.record_threshold, 0.5);
    assert_eq!(config.session.max_messages, 20);
    assert_eq!(config.session.ttl_secs, 900);
    assert_eq!(config.session.sweep_interval_secs, 60);
    assert_eq!(config.reply.summary_policy, SummaryPolicy::Always);
    assert!(!config.lookup.enabled);
    assert_eq!(config.lookup.max_results, 3);
}

#[test]
fn default_struct_matches_empty_toml() {
    let from_toml = load_config_from_str("").unwrap();
    let from_default = ConciergeConfig::default();
    assert_eq!(
        serde_json::to_value(&from_toml).unwrap(),
        serde_json::to_value(&from_default).unwrap()
    );
}

#[test]
fn unknown_key_gets_suggestion() {
    let errors = load_and_validate_str("[retrieval]\nrecord_treshold = 0.4\n")
        .expect_err("unknown key must be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "record_treshold");
            assert_eq!(suggestion.as_deref(), Some("record_threshold"));
            assert!(valid_keys.contains("grounding_path"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_rejected() {
    let errors = load_and_validate_str("[telemetry]\nenabled = true\n")
        .expect_err("unknown section must be rejected");
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_reports_invalid_type() {
    let errors = load_and_validate_str("[session]\nmax_messages = \"many\"\n")
        .expect_err("string for integer must be rejected");
    match &errors[0] {
        ConfigError::InvalidType { key, .. } => assert_eq!(key, "session.max_messages"),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

#[test]
fn invalid_summary_policy_rejected() {
    let result = load_config_from_str("[reply]\nsummary_policy = \"sometimes\"\n");
    assert!(result.is_err());
}

#[test]
fn validation_errors_surface_through_loader() {
    let errors = load_and_validate_str("[lookup]\nenabled = true\n")
        .expect_err("lookup without credentials must fail validation");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn loads_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[agent]\nname = \"from-file\"\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config should load");
    assert_eq!(config.agent.name, "from-file");
}

#[test]
fn unknown_key_in_file_gets_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[agent]\nname = \"x\"\npersna = \"y\"\n").unwrap();

    let errors = load_and_validate_path(&path).expect_err("typo must be rejected");
    match &errors[0] {
        ConfigError::UnknownKey { suggestion, .. } => {
            assert_eq!(suggestion.as_deref(), Some("persona"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "concierge.toml",
            "[provider]\nchat_model = \"from-file\"\nreply_max_tokens = 200\n",
        )?;
        jail.set_env("CONCIERGE_PROVIDER_CHAT_MODEL", "from-env");
        jail.set_env("CONCIERGE_PROVIDER_REPLY_MAX_TOKENS", "250");
        jail.set_env("CONCIERGE_SESSION_TTL_SECS", "30");

        let config = load_config()?;
        assert_eq!(config.provider.chat_model, "from-env");
        assert_eq!(config.provider.reply_max_tokens, 250);
        assert_eq!(config.session.ttl_secs, 30);
        Ok(())
    });
}
