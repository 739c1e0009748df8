// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web lookup through the Google Custom Search JSON API.

use std::time::Duration;

use async_trait::async_trait;
use concierge_config::model::LookupConfig;
use concierge_core::error::ConciergeError;
use concierge_core::traits::{LookupAdapter, PluginAdapter};
use concierge_core::types::{AdapterType, HealthStatus};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    snippet: Option<String>,
}

/// Lookup adapter returning result snippets for a query.
pub struct GoogleSearchLookup {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
    max_results: usize,
}

impl GoogleSearchLookup {
    /// Builds the adapter. Fails if the key or engine id is missing.
    pub fn new(config: &LookupConfig) -> Result<Self, ConciergeError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConciergeError::Config("lookup.api_key is not set".into()))?;
        let engine_id = config
            .engine_id
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConciergeError::Config("lookup.engine_id is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConciergeError::Lookup {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            engine_id,
            max_results: config.max_results.max(1),
        })
    }
}

#[async_trait]
impl PluginAdapter for GoogleSearchLookup {
    fn name(&self) -> &str {
        "google-search"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Lookup
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        match self.lookup("real estate").await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl LookupAdapter for GoogleSearchLookup {
    async fn lookup(&self, query: &str) -> Result<Vec<String>, ConciergeError> {
        let num = self.max_results.to_string();
        let url = reqwest::Url::parse_with_params(
            &self.base_url,
            &[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ],
        )
        .map_err(|e| ConciergeError::Lookup {
            message: format!("invalid search url: {e}"),
            source: Some(Box::new(e)),
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ConciergeError::Lookup {
                message: format!("search request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConciergeError::Lookup {
                message: format!("search endpoint returned {status}"),
                source: None,
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| ConciergeError::Lookup {
            message: format!("malformed search response: {e}"),
            source: Some(Box::new(e)),
        })?;

        let snippets: Vec<String> = body
            .items
            .into_iter()
            .filter_map(|item| item.snippet)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(self.max_results)
            .collect();

        debug!(results = snippets.len(), "web lookup completed");
        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> LookupConfig {
        LookupConfig {
            enabled: true,
            base_url: server.uri(),
            api_key: Some("g-key".into()),
            engine_id: Some("cx-1".into()),
            max_results: 2,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn returns_top_snippets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("key", "g-key"))
            .and(query_param("cx", "cx-1"))
            .and(query_param("q", "berlin rent index"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"snippet": "Average rent rose 5%."},
                    {"title": "no snippet"},
                    {"snippet": "  "},
                    {"snippet": "Mitte is the priciest district."},
                    {"snippet": "Third result."}
                ]
            })))
            .mount(&server)
            .await;

        let lookup = GoogleSearchLookup::new(&config(&server)).unwrap();
        let snippets = lookup.lookup("berlin rent index").await.unwrap();
        assert_eq!(
            snippets,
            vec!["Average rent rose 5%.", "Mitte is the priciest district."]
        );
    }

    #[tokio::test]
    async fn no_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "customsearch#search"})))
            .mount(&server)
            .await;

        let lookup = GoogleSearchLookup::new(&config(&server)).unwrap();
        assert!(lookup.lookup("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quota_error_is_lookup_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let lookup = GoogleSearchLookup::new(&config(&server)).unwrap();
        let err = lookup.lookup("x").await.unwrap_err();
        assert!(matches!(err, ConciergeError::Lookup { .. }));
    }

    #[test]
    fn missing_credentials_rejected() {
        let mut config = LookupConfig::default();
        config.api_key = Some("k".into());
        assert!(matches!(
            GoogleSearchLookup::new(&config),
            Err(ConciergeError::Config(_))
        ));
    }
}
