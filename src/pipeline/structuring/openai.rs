use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sanitize::is_valid_schema_name;
use super::types::{LlmClient, StructuredRequest};
use super::ExtractionError;
use crate::config::ServiceConfig;

/// Blocking client for an OpenAI-compatible chat completions endpoint
/// with strict `json_schema` structured outputs.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: Option<u64>,
}

impl OpenAiClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, ExtractionError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Request body for `/chat/completions`.
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_request(request: &StructuredRequest<'a>) -> Self {
        Self {
            model: request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: request.schema_name,
                    strict: true,
                    schema: request.schema,
                },
            },
        }
    }
}

/// Response body from `/chat/completions`.
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Pull the structured payload out of a completion response.
fn parse_completion(response: ChatCompletionResponse) -> Result<Value, ExtractionError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ExtractionError::MalformedResponse("response has no choices".into()))?;

    if let Some(refusal) = message.refusal {
        return Err(ExtractionError::Refusal(refusal));
    }

    let content = message
        .content
        .ok_or_else(|| ExtractionError::MalformedResponse("response has no content".into()))?;

    serde_json::from_str(&content).map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
}

impl LlmClient for OpenAiClient {
    fn generate_structured(
        &self,
        request: &StructuredRequest<'_>,
    ) -> Result<Value, ExtractionError> {
        if !is_valid_schema_name(request.schema_name) {
            return Err(ExtractionError::Config(format!(
                "schema name '{}' is not accepted by the service",
                request.schema_name
            )));
        }

        let _span = tracing::debug_span!(
            "structured_call",
            model = request.model,
            schema = request.schema_name
        )
        .entered();

        let body = ChatCompletionRequest::from_request(request);
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractionError::ServiceConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractionError::HttpClient(match self.timeout_secs {
                        Some(secs) => format!("Request timed out after {secs}s"),
                        None => "Request timed out".to_string(),
                    })
                } else {
                    ExtractionError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Generative service returned an error status");
            return Err(ExtractionError::ServiceStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        parse_completion(parsed)
    }
}

/// Scripted reply for `MockLlmClient`.
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    /// Fails the call with a service status error carrying this body.
    Fail(String),
}

/// A request as seen by `MockLlmClient`.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system: String,
    pub user: String,
    pub schema_name: String,
    pub schema: Value,
}

/// Mock LLM client for testing — replays scripted replies in order and
/// records every request it receives.
pub struct MockLlmClient {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlmClient {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl LlmClient for MockLlmClient {
    fn generate_structured(
        &self,
        request: &StructuredRequest<'_>,
    ) -> Result<Value, ExtractionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: request.model.to_string(),
                system: request.system.to_string(),
                user: request.user.to_string(),
                schema_name: request.schema_name.to_string(),
                schema: request.schema.clone(),
            });
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .ok_or_else(|| ExtractionError::ServiceConnection("mock://exhausted".into()))?;

        match reply {
            MockReply::Json(value) => Ok(value),
            MockReply::Fail(body) => Err(ExtractionError::ServiceStatus { status: 500, body }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(base_url: &str) -> ServiceConfig {
        ServiceConfig {
            api_key: "sk-test".into(),
            base_url: base_url.into(),
            model: "gpt-4.1".into(),
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = OpenAiClient::new(&config("https://api.openai.com/v1/")).unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.completions_url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(client.timeout_secs, Some(30));
    }

    #[test]
    fn request_body_carries_strict_schema() {
        let schema = json!({"type": "object"});
        let request = StructuredRequest {
            model: "gpt-4.1",
            system: "sys",
            user: "doc",
            schema_name: "Reports_Extraction",
            schema: &schema,
        };
        let body = serde_json::to_value(ChatCompletionRequest::from_request(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "doc");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "Reports_Extraction");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["schema"], schema);
    }

    #[test]
    fn completion_content_is_parsed_as_json() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"a\": 1}", "refusal": null } }]
        }))
        .unwrap();
        assert_eq!(parse_completion(response).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn completion_refusal_is_an_error() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null, "refusal": "I can't help with that" } }]
        }))
        .unwrap();
        assert!(matches!(parse_completion(response), Err(ExtractionError::Refusal(_))));
    }

    #[test]
    fn completion_without_choices_is_malformed() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(
            parse_completion(response),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn completion_with_invalid_json_is_malformed() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "not json" } }]
        }))
        .unwrap();
        assert!(matches!(
            parse_completion(response),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn invalid_schema_name_rejected_before_sending() {
        let client = OpenAiClient::new(&config("http://127.0.0.1:9")).unwrap();
        let schema = json!({});
        let request = StructuredRequest {
            model: "m",
            system: "s",
            user: "u",
            schema_name: "bad name",
            schema: &schema,
        };
        assert!(matches!(
            client.generate_structured(&request),
            Err(ExtractionError::Config(_))
        ));
    }

    #[test]
    fn mock_replays_in_order_and_records_calls() {
        let mock = MockLlmClient::new(vec![
            MockReply::Json(json!({"n": 1})),
            MockReply::Fail("rate limited".into()),
        ]);
        let schema = json!({});
        let request = StructuredRequest {
            model: "m",
            system: "s",
            user: "u",
            schema_name: "S",
            schema: &schema,
        };
        assert_eq!(mock.generate_structured(&request).unwrap(), json!({"n": 1}));
        assert!(matches!(
            mock.generate_structured(&request),
            Err(ExtractionError::ServiceStatus { status: 500, .. })
        ));
        assert!(mock.generate_structured(&request).is_err());
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.calls()[0].schema_name, "S");
    }
}
