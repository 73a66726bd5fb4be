//! Shared test double for the [`HttpClient`] seam.
//!
//! Canned responses via a builder (`on_get`/`on_post`/`failing`) and
//! request capture for post-execution assertions.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::traits::{HttpClient, HttpResponse};

/// In-memory [`HttpClient`] for tool tests.
#[derive(Default)]
pub struct MockHttp {
    get_response: Option<(u16, String)>,
    post_response: Option<(u16, String)>,
    failure: Option<String>,
    last_get_url: Mutex<Option<String>>,
    last_post: Mutex<Option<CapturedPost>>,
}

/// A captured POST request.
#[derive(Clone, Debug)]
pub struct CapturedPost {
    /// Request URL.
    pub url: String,
    /// Headers as sent.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Value,
}

impl MockHttp {
    /// An empty mock; requests fail until a response is configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: respond to GETs with this status and body.
    #[must_use]
    pub fn on_get(mut self, status: u16, body: &str) -> Self {
        self.get_response = Some((status, body.to_string()));
        self
    }

    /// Builder: respond to POSTs with this status and body.
    #[must_use]
    pub fn on_post(mut self, status: u16, body: &str) -> Self {
        self.post_response = Some((status, body.to_string()));
        self
    }

    /// Builder: fail every request with this message.
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// URL of the last GET, if any.
    pub fn last_get_url(&self) -> Option<String> {
        self.last_get_url.lock().unwrap().clone()
    }

    /// Headers of the last POST (empty if none).
    pub fn last_post_headers(&self) -> Vec<(String, String)> {
        self.last_post
            .lock()
            .unwrap()
            .as_ref()
            .map(|p| p.headers.clone())
            .unwrap_or_default()
    }

    /// Body of the last POST, if any.
    pub fn last_post_body(&self) -> Option<Value> {
        self.last_post.lock().unwrap().as_ref().map(|p| p.body.clone())
    }

    fn check_failure(&self) -> Result<(), ToolError> {
        match &self.failure {
            Some(message) => Err(ToolError::Http {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, ToolError> {
        *self.last_get_url.lock().unwrap() = Some(url.to_string());
        self.check_failure()?;
        let (status, body) = self.get_response.clone().ok_or_else(|| ToolError::Http {
            message: "MockHttp: no GET response configured".into(),
        })?;
        Ok(HttpResponse { status, body })
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpResponse, ToolError> {
        *self.last_post.lock().unwrap() = Some(CapturedPost {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            body: body.clone(),
        });
        self.check_failure()?;
        let (status, body) = self.post_response.clone().ok_or_else(|| ToolError::Http {
            message: "MockHttp: no POST response configured".into(),
        })?;
        Ok(HttpResponse { status, body })
    }
}
