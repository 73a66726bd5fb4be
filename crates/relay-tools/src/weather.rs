//! `get_weather` tool — current conditions via the free wttr.in API.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{ToolDescriptor, ToolOutcome};
use serde_json::{Value, json};

use crate::errors::ToolError;
use crate::traits::{HttpClient, RelayTool, require_arg};

const WTTR_BASE_URL: &str = "https://wttr.in";

/// Current-weather lookup for a city.
pub struct WeatherTool {
    http: Arc<dyn HttpClient>,
}

impl WeatherTool {
    /// Create the tool with the given HTTP client.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

/// First string value under `key[0].value` (wttr.in wraps scalars this way).
fn nested_value(parent: &Value, key: &str) -> String {
    parent
        .get(key)
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("value"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Plain string field.
fn field(parent: &Value, key: &str) -> String {
    parent
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Pull the fields relay reports out of wttr.in's `format=j1` body.
fn summarize(body: &Value) -> Option<Value> {
    let current = body.get("current_condition")?.get(0)?;
    let area = body.get("nearest_area")?.get(0)?;

    Some(json!({
        "location": format!("{}, {}", nested_value(area, "areaName"), nested_value(area, "country")),
        "temperature": format!("{}°C / {}°F", field(current, "temp_C"), field(current, "temp_F")),
        "condition": nested_value(current, "weatherDesc"),
        "humidity": format!("{}%", field(current, "humidity")),
        "wind": format!("{} km/h", field(current, "windspeedKmph")),
        "feels_like": format!("{}°C", field(current, "FeelsLikeC")),
    }))
}

#[async_trait]
impl RelayTool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "get_weather",
            "Get current weather for a city",
            &[("city", "string")],
        )
    }

    async fn execute(
        &self,
        arguments: &BTreeMap<String, String>,
    ) -> Result<ToolOutcome, ToolError> {
        let city = require_arg(arguments, "city")?;
        let url = format!("{WTTR_BASE_URL}/{city}?format=j1");

        let response = match self.http.get(&url).await {
            Ok(r) => r,
            Err(e) => return Ok(ToolOutcome::failure(format!("Weather API error: {e}"))),
        };
        if response.status != 200 {
            return Ok(ToolOutcome::failure(format!(
                "Could not fetch weather for {city}"
            )));
        }
        let body = match response.json() {
            Ok(v) => v,
            Err(e) => return Ok(ToolOutcome::failure(format!("Weather API error: {e}"))),
        };
        match summarize(&body) {
            Some(data) => Ok(ToolOutcome {
                success: true,
                data,
                error: None,
            }),
            None => Ok(ToolOutcome::failure(format!(
                "Weather API returned an unexpected shape for {city}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockHttp;
    use assert_matches::assert_matches;

    fn args(city: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("city".to_string(), city.to_string())])
    }

    fn wttr_body() -> &'static str {
        r#"{
            "current_condition": [{
                "temp_C": "15", "temp_F": "59", "humidity": "60",
                "windspeedKmph": "11", "FeelsLikeC": "14",
                "weatherDesc": [{"value": "Partly cloudy"}]
            }],
            "nearest_area": [{
                "areaName": [{"value": "Tokyo"}],
                "country": [{"value": "Japan"}]
            }]
        }"#
    }

    #[tokio::test]
    async fn summarizes_wttr_response() {
        let http = Arc::new(MockHttp::new().on_get(200, wttr_body()));
        let tool = WeatherTool::new(http);
        let outcome = tool.execute(&args("Tokyo")).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.data["location"], "Tokyo, Japan");
        assert_eq!(outcome.data["temperature"], "15°C / 59°F");
        assert_eq!(outcome.data["condition"], "Partly cloudy");
    }

    #[tokio::test]
    async fn non_200_is_a_backend_failure() {
        let http = Arc::new(MockHttp::new().on_get(404, "not found"));
        let tool = WeatherTool::new(http);
        let outcome = tool.execute(&args("Nowhereville")).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("Nowhereville"));
    }

    #[tokio::test]
    async fn transport_error_is_folded_into_outcome() {
        let http = Arc::new(MockHttp::new().failing("connection refused"));
        let tool = WeatherTool::new(http);
        let outcome = tool.execute(&args("Tokyo")).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn missing_city_is_a_caller_error() {
        let http = Arc::new(MockHttp::new().on_get(200, wttr_body()));
        let tool = WeatherTool::new(http);
        let err = tool.execute(&BTreeMap::new()).await.unwrap_err();
        assert_matches!(err, ToolError::MissingArgument("city"));
    }
}
