//! [`ChatClient`] — reqwest implementation of [`ReasoningService`] against
//! an OpenAI-compatible `/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::{RoutingDecision, ToolDescriptor};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::errors::ReasoningError;
use crate::prompts::{ROUTING_SYSTEM, routing_prompt, synthesis_prompt};
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat, parse_routing_reply};
use crate::{ReasoningService, SynthesisInput};

/// Configuration for [`ChatClient`].
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// API base URL, no trailing slash (e.g. `https://api.groq.com/openai/v1`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Bearer API key.
    pub api_key: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Routing-call temperature.
    pub routing_temperature: f64,
    /// Synthesis-call temperature.
    pub synthesis_temperature: f64,
    /// Soft word cap passed to the synthesis prompt.
    pub max_answer_words: u32,
}

/// Production reasoning-service client.
pub struct ChatClient {
    config: ChatConfig,
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a new client with a fresh HTTP connection pool.
    #[must_use]
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new client sharing an existing HTTP connection pool.
    #[must_use]
    pub fn with_client(config: ChatConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn build_headers(&self) -> Result<HeaderMap, ReasoningError> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = format!("Bearer {}", self.config.api_key);
        let _ = headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| ReasoningError::MalformedOutput(format!("invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    /// One chat completions round trip, returning the first choice's text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, ReasoningError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .timeout(self.config.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "reasoning service returned error status");
            return Err(ReasoningError::Status {
                status: status.as_u16(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::MalformedOutput(format!("response body: {e}")))?;
        body.into_text()
    }
}

#[async_trait]
impl ReasoningService for ChatClient {
    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn route(
        &self,
        request_text: &str,
        tools: &[ToolDescriptor],
    ) -> Result<RoutingDecision, ReasoningError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(ROUTING_SYSTEM),
                ChatMessage::user(routing_prompt(request_text, tools)),
            ],
            temperature: self.config.routing_temperature,
            response_format: Some(ResponseFormat::json_object()),
        };
        let raw = self.complete(&request).await?;
        let decision = parse_routing_reply(&raw)?;
        debug!(tool = ?decision.tool_name, "routing decision");
        Ok(decision)
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn synthesize(
        &self,
        request_text: &str,
        input: &SynthesisInput,
    ) -> Result<String, ReasoningError> {
        let (system, user) = synthesis_prompt(request_text, input, self.config.max_answer_words);
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.config.synthesis_temperature,
            response_format: None,
        };
        self.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> ChatConfig {
        ChatConfig {
            base_url,
            model: "llama-3.3-70b-versatile".into(),
            api_key: "test-key".into(),
            timeout: Duration::from_secs(5),
            routing_temperature: 0.3,
            synthesis_temperature: 0.7,
            max_answer_words: 150,
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[tokio::test]
    async fn route_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "llama-3.3-70b-versatile",
                "temperature": 0.3,
                "response_format": {"type": "json_object"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                r#"{"tool": "get_weather", "parameters": {"city": "Tokyo"}, "reasoning": "weather"}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(config(server.uri()));
        let tools = vec![ToolDescriptor::new("get_weather", "weather", &[("city", "string")])];
        let decision = client.route("What's the weather in Tokyo?", &tools).await.unwrap();
        assert_eq!(decision.tool_name.as_deref(), Some("get_weather"));
        assert_eq!(decision.arguments.get("city").map(String::as_str), Some("Tokyo"));
    }

    #[tokio::test]
    async fn synthesize_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_body("It is 15°C in Tokyo right now.")),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(config(server.uri()));
        let answer = client
            .synthesize(
                "What's the weather in Tokyo?",
                &SynthesisInput::ToolData(json!({"temperature": "15°C"})),
            )
            .await
            .unwrap();
        assert!(answer.contains("15°C"));
    }

    #[tokio::test]
    async fn non_2xx_maps_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = ChatClient::new(config(server.uri()));
        let err = client
            .synthesize("hi", &SynthesisInput::Conversation)
            .await
            .unwrap_err();
        assert_matches!(err, ReasoningError::Status { status: 429 });
    }

    #[tokio::test]
    async fn malformed_routing_reply_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("not json at all")))
            .mount(&server)
            .await;

        let client = ChatClient::new(config(server.uri()));
        let err = client.route("hi", &[]).await.unwrap_err();
        assert_matches!(err, ReasoningError::MalformedOutput(_));
    }
}
