use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use aii_core::{Error, QueryResult, SettingsStore, TelemetryClient};

const DEFAULT_BASE_URL: &str = "https://api.applicationinsights.io";

/// Client for the Application Insights REST query API.
///
/// The API key and target application are resolved from the injected
/// settings store at the start of each query, so `config` changes in the
/// shell apply to the next call. Both must be present before any request
/// is sent.
pub struct AppInsightsClient {
    http: Client,
    store: Arc<SettingsStore>,
    base_url: String,
    app_id_override: Option<String>,
}

impl AppInsightsClient {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self {
            http: Client::new(),
            store,
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id_override: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Target a specific application instead of the configured one.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id_override = Some(app_id.into());
        self
    }

    fn resolve_target(&self) -> Result<(String, String), Error> {
        let settings = self.store.snapshot();

        if settings.app_insights_api_key.is_empty() {
            return Err(Error::config(
                "App Insights API key not configured. Use \"config api-key <key>\" to set it.",
            ));
        }

        let app_id = self
            .app_id_override
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or(settings.current_app_id);
        if app_id.is_empty() {
            return Err(Error::config(
                "No App Insights application selected. Use \"appinsight <app-id>\" first.",
            ));
        }

        Ok((settings.app_insights_api_key, app_id))
    }
}

#[async_trait]
impl TelemetryClient for AppInsightsClient {
    async fn run_query(&self, query: &str) -> Result<QueryResult, Error> {
        let (api_key, app_id) = self.resolve_target()?;

        let url = format!("{}/v1/apps/{}/query", self.base_url, app_id);
        debug!(%app_id, "executing telemetry query");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "telemetry query failed");
            return Err(Error::query(status.as_u16(), body));
        }

        response
            .json::<QueryResult>()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(api_key: &str, app_id: &str) -> (tempfile::TempDir, Arc<SettingsStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join("config.toml")).unwrap();
        if !api_key.is_empty() {
            store.set_app_insights_api_key(api_key).unwrap();
        }
        if !app_id.is_empty() {
            store.set_current_app_id(app_id).unwrap();
        }
        (dir, Arc::new(store))
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let (_dir, store) = store_with("", "app-1");
        let client = AppInsightsClient::new(store);
        let err = client.run_query("customEvents | take 1").await.unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("API key not configured"));
    }

    #[tokio::test]
    async fn test_missing_app_id_fails_before_network() {
        let (_dir, store) = store_with("key", "");
        let client = AppInsightsClient::new(store);
        let err = client.run_query("customEvents | take 1").await.unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("No App Insights application"));
    }

    #[test]
    fn test_app_id_override_wins() {
        let (_dir, store) = store_with("key", "configured");
        let client = AppInsightsClient::new(store).with_app_id("explicit");
        let (_, app_id) = client.resolve_target().unwrap();
        assert_eq!(app_id, "explicit");
    }
}
