//! `web_search` tool — Serper (Google Search API) integration.
//!
//! Returns the top organic results (title/link/snippet) plus the knowledge
//! graph description when present. An unconfigured API key is reported as
//! a backend failure, never a crash.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{ToolDescriptor, ToolOutcome};
use serde_json::{Value, json};

use crate::errors::ToolError;
use crate::traits::{HttpClient, RelayTool, require_arg};

const SERPER_URL: &str = "https://google.serper.dev/search";
const MAX_RESULTS: usize = 5;

/// Web search via the Serper API.
pub struct WebSearchTool {
    http: Arc<dyn HttpClient>,
    api_key: Option<String>,
}

impl WebSearchTool {
    /// Create the tool. `api_key: None` yields a configured-off tool that
    /// reports failure on use (matching the upstream behavior).
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

/// Shape the Serper body into relay's search result payload.
fn summarize(query: &str, body: &Value) -> Value {
    let results: Vec<Value> = body
        .get("organic")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(MAX_RESULTS)
                .map(|item| {
                    json!({
                        "title": item.get("title").cloned().unwrap_or(Value::Null),
                        "link": item.get("link").cloned().unwrap_or(Value::Null),
                        "snippet": item.get("snippet").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let knowledge = body
        .get("knowledgeGraph")
        .and_then(|kg| kg.get("description"))
        .cloned()
        .unwrap_or(Value::Null);

    json!({
        "query": query,
        "results": results,
        "knowledge_graph": knowledge,
    })
}

#[async_trait]
impl RelayTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "web_search",
            "Search the web for information",
            &[("query", "string")],
        )
    }

    async fn execute(
        &self,
        arguments: &BTreeMap<String, String>,
    ) -> Result<ToolOutcome, ToolError> {
        let query = require_arg(arguments, "query")?;
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(ToolOutcome::failure("SERPER_API_KEY not configured"));
        };

        let payload = json!({ "q": query, "num": MAX_RESULTS });
        let headers = [("X-API-KEY", api_key), ("Content-Type", "application/json")];
        let response = match self.http.post_json(SERPER_URL, &headers, &payload).await {
            Ok(r) => r,
            Err(e) => return Ok(ToolOutcome::failure(format!("Web search error: {e}"))),
        };
        if response.status != 200 {
            return Ok(ToolOutcome::failure(format!(
                "Serper API error: {}",
                response.status
            )));
        }
        match response.json() {
            Ok(body) => Ok(ToolOutcome {
                success: true,
                data: summarize(query, &body),
                error: None,
            }),
            Err(e) => Ok(ToolOutcome::failure(format!("Web search error: {e}"))),
        }
    }
}
