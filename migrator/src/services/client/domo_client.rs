use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::errors::{ClientError, ClientResult};
use super::retry::RetryPolicy;
use super::types::{ClientCredentials, HttpMethod, RequestBody};
use super::Transport;
use crate::services::config::NetworkConfig;

/// Client for the platform's REST API
#[derive(Clone)]
pub struct DomoClient {
    pub(crate) http_client: Client,
    base_url: String,
    credentials: ClientCredentials,
    retry: RetryPolicy,
}

impl DomoClient {
    /// Create a client for one instance, e.g. `https://acme.domo.com`
    pub fn new(
        base_url: &str,
        credentials: ClientCredentials,
        network: &NetworkConfig,
        retry: RetryPolicy,
    ) -> ClientResult<Self> {
        let http_client = Client::builder()
            .user_agent(network.user_agent.as_str())
            .timeout(Duration::from_millis(network.request_timeout_ms))
            .connect_timeout(Duration::from_millis(network.connect_timeout_ms))
            .build()
            .map_err(|e| ClientError::InvalidConfig {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self::with_http_client(base_url, credentials, http_client, retry))
    }

    /// Create a client around a pre-built `reqwest::Client`
    pub fn with_http_client(
        base_url: &str,
        credentials: ClientCredentials,
        http_client: Client,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_once(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> ClientResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let (auth_header, auth_value) = self.credentials.header();

        let mut request = self
            .http_client
            .request(method.into(), &url)
            .header(auth_header, auth_value)
            .header("Accept", "application/json");

        if let Some(body) = body {
            request = request.header("Content-Type", body.content_type());
            request = match body {
                RequestBody::Json(json) => request.json(json),
                RequestBody::Csv(text) => request.body(text.clone()),
            };
        }

        let response = request.send().await.map_err(|e| ClientError::NetworkError {
            message: format!("{} {}: {}", method, path, e),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ClientError::NetworkError {
            message: format!("Failed to read response for {} {}: {}", method, path, e),
        })?;

        if !status.is_success() {
            error!(%method, path, status = status.as_u16(), "Platform request failed");
            return Err(ClientError::RequestFailed {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(parse_body(&text))
    }
}

/// Empty bodies become `null`, non-JSON bodies are kept as a string
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl Transport for DomoClient {
    #[instrument(skip(self, body), err)]
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> ClientResult<Value> {
        let operation = format!("{} {}", method, path);
        let value = self
            .retry
            .execute(&operation, || self.send_once(method, path, body))
            .await?;
        debug!(%method, path, "Platform request succeeded");
        Ok(value)
    }

    #[instrument(skip(self, body), err)]
    async fn request_once(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> ClientResult<Value> {
        self.send_once(method, path, body).await
    }
}
