//! Typed HTTP client for the detection/simulation backend.
//!
//! All requests are JSON over HTTP against a configurable base URL. Any
//! non-success status becomes `ApiError::Status { code, body }` so callers
//! can surface it; nothing is silently swallowed.
//!
//! The canonical thresholds endpoint is `/defense-thresholds`; the legacy
//! `/thresholds` pair is deprecated and not supported.

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{
    BlocklistEntry, DefenseThresholds, MetricsSnapshot, SimulateRequest, StatusReply,
};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

/// Abstraction over the backend so tests can inject scripted responses.
pub trait ApiBackend: Send + Sync {
    fn get_stats(&self) -> BoxFuture<'static, Result<MetricsSnapshot, ApiError>>;
    fn get_blocklist(&self) -> BoxFuture<'static, Result<Vec<BlocklistEntry>, ApiError>>;
    fn get_defense_thresholds(&self) -> BoxFuture<'static, Result<DefenseThresholds, ApiError>>;
    fn set_defense_thresholds(
        &self,
        thresholds: DefenseThresholds,
    ) -> BoxFuture<'static, Result<StatusReply, ApiError>>;
    fn simulate(&self, request: SimulateRequest)
        -> BoxFuture<'static, Result<StatusReply, ApiError>>;
    fn reset(&self) -> BoxFuture<'static, Result<StatusReply, ApiError>>;
}

/// Production backend client over reqwest.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build a client against an explicit base URL (used by tests).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check status then decode, reading the body text for error reporting.
    async fn checked<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        response.json::<T>().await.map_err(ApiError::from)
    }

    async fn get_json<T: DeserializeOwned>(
        http: reqwest::Client,
        url: String,
    ) -> Result<T, ApiError> {
        let response = http.get(&url).send().await?;
        Self::checked(response).await
    }
}

impl ApiBackend for ApiClient {
    fn get_stats(&self) -> BoxFuture<'static, Result<MetricsSnapshot, ApiError>> {
        let http = self.http.clone();
        let url = self.url("/stats");
        Box::pin(Self::get_json(http, url))
    }

    fn get_blocklist(&self) -> BoxFuture<'static, Result<Vec<BlocklistEntry>, ApiError>> {
        let http = self.http.clone();
        let url = self.url("/blocklist");
        Box::pin(Self::get_json(http, url))
    }

    fn get_defense_thresholds(&self) -> BoxFuture<'static, Result<DefenseThresholds, ApiError>> {
        let http = self.http.clone();
        let url = self.url("/defense-thresholds");
        Box::pin(Self::get_json(http, url))
    }

    fn set_defense_thresholds(
        &self,
        thresholds: DefenseThresholds,
    ) -> BoxFuture<'static, Result<StatusReply, ApiError>> {
        let http = self.http.clone();
        let url = self.url("/defense-thresholds");
        Box::pin(async move {
            let response = http.post(&url).json(&thresholds).send().await?;
            Self::checked(response).await
        })
    }

    fn simulate(
        &self,
        request: SimulateRequest,
    ) -> BoxFuture<'static, Result<StatusReply, ApiError>> {
        let http = self.http.clone();
        let url = self.url("/simulate");
        Box::pin(async move {
            let response = http.post(&url).json(&request).send().await?;
            Self::checked(response).await
        })
    }

    fn reset(&self) -> BoxFuture<'static, Result<StatusReply, ApiError>> {
        let http = self.http.clone();
        let url = self.url("/reset");
        Box::pin(async move {
            let response = http.post(&url).send().await?;
            Self::checked(response).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = ApiClient::with_base_url("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url("/stats"), "http://localhost:5000/stats");
    }

    #[test]
    fn test_new_uses_config_base_url() {
        let config = AppConfig {
            base_url: "http://dash.internal:8080".to_string(),
            ..AppConfig::default()
        };
        let client = ApiClient::new(&config);
        assert_eq!(client.url("/reset"), "http://dash.internal:8080/reset");
    }
}
