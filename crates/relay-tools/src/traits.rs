//! Tool and HTTP client traits — the seams tests substitute.

use std::collections::BTreeMap;

use async_trait::async_trait;
use relay_core::{ToolDescriptor, ToolOutcome};
use serde_json::Value;

use crate::errors::ToolError;

/// A decoded HTTP response.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: String,
}

impl HttpResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, ToolError> {
        serde_json::from_str(&self.body).map_err(|e| ToolError::Http {
            message: format!("invalid JSON body: {e}"),
        })
    }
}

/// Minimal HTTP surface tools use to reach their upstream APIs.
///
/// Narrow by design so tool tests can mock it (see [`crate::testutil`]).
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL.
    async fn get(&self, url: &str) -> Result<HttpResponse, ToolError>;

    /// POST a JSON body with extra headers.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<HttpResponse, ToolError>;
}

/// One named capability behind the uniform invoke contract.
#[async_trait]
pub trait RelayTool: Send + Sync {
    /// Registry name (e.g. `get_weather`).
    fn name(&self) -> &str;

    /// Listing descriptor (name, description, argument schema).
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool.
    ///
    /// Returns `Err` only for caller mistakes (missing arguments);
    /// upstream API failures come back as `ToolOutcome { success: false }`.
    async fn execute(&self, arguments: &BTreeMap<String, String>)
    -> Result<ToolOutcome, ToolError>;
}

/// Fetch a required argument.
pub(crate) fn require_arg<'a>(
    arguments: &'a BTreeMap<String, String>,
    name: &'static str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ToolError::MissingArgument(name))
}
