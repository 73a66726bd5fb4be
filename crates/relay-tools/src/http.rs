//! Production [`HttpClient`] backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::traits::{HttpClient, HttpResponse};

/// reqwest-backed HTTP client with a per-request timeout.
pub struct ReqwestHttp {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttp {
    /// Create a client with the given per-request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Create a client sharing an existing connection pool.
    #[must_use]
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn decode(response: reqwest::Response) -> Result<HttpResponse, ToolError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ToolError::Http {
            message: format!("failed to read body: {e}"),
        })?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, ToolError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ToolError::Http {
                message: format!("GET {url} failed: {e}"),
            })?;
        Self::decode(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpResponse, ToolError> {
        let mut request = self.client.post(url).timeout(self.timeout).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await.map_err(|e| ToolError::Http {
            message: format!("POST {url} failed: {e}"),
        })?;
        Self::decode(response).await
    }
}
