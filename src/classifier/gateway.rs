// file: src/classifier/gateway.rs
// description: chat-completions gateway submitting record batches under a declared output schema
// reference: https://platform.openai.com/docs/guides/structured-outputs

use crate::config::ClassifierConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One batched classification request: an ordered payload of records, the
/// instructions, and the closed output schema the response must satisfy.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub system_prompt: String,
    pub payload: Value,
    pub schema_name: &'static str,
    pub schema: Value,
    pub temperature: f32,
}

/// Seam between the batch engine and the external classification services.
/// Stages receive a handle rather than reaching for a process-wide client.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Submit one chunk and return the response content parsed as JSON.
    /// Non-success status, transport failures, and unparseable bodies are
    /// reported as errors; structural validation against the declared schema
    /// is the caller's job.
    async fn classify(&self, request: ClassifyRequest) -> Result<Value>;

    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenAI-compatible chat-completions classifier. The primary instance runs
/// with strict `json_schema` structured outputs; independently sourced
/// auditors that lack strict schema support run in `json_object` mode, where
/// the schema is enforced by the prompt contract and response parsing.
pub struct ChatClassifier {
    name: String,
    client: Client,
    config: ClassifierConfig,
    api_key: Option<String>,
}

impl ChatClassifier {
    pub fn new(name: &str, config: ClassifierConfig) -> Self {
        let api_key = config.resolve_api_key();
        Self {
            name: name.to_string(),
            client: Client::new(),
            config,
            api_key,
        }
    }

    fn response_format(&self, request: &ClassifyRequest) -> Value {
        if self.config.structured_outputs {
            serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "schema": request.schema,
                    "strict": true
                }
            })
        } else {
            serde_json::json!({ "type": "json_object" })
        }
    }
}

#[async_trait]
impl Classifier for ChatClassifier {
    async fn classify(&self, request: ClassifyRequest) -> Result<Value> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.payload.to_string(),
                },
            ],
            temperature: request.temperature,
            response_format: self.response_format(&request),
            max_tokens: self.config.max_tokens,
        };

        debug!(
            classifier = %self.name,
            model = %self.config.model,
            schema = request.schema_name,
            "submitting classification chunk"
        );

        let mut http = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await.map_err(|e| PipelineError::Gateway {
            classifier: self.name.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Gateway {
                classifier: self.name.clone(),
                message: format!("status {status}: {body}"),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| PipelineError::Gateway {
            classifier: self.name.clone(),
            message: format!("unparseable response body: {e}"),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Gateway {
                classifier: self.name.clone(),
                message: "response contained no choices".to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| {
            PipelineError::SchemaValidation(format!(
                "classifier '{}' returned non-JSON content: {e}",
                self.name
            ))
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;

    fn test_config(structured: bool) -> ClassifierConfig {
        ClassifierConfig {
            endpoint: "https://api.example.com/v1/chat/completions".to_string(),
            model: "test-model".to_string(),
            api_key: Some("sk-test".to_string()),
            api_key_env: None,
            structured_outputs: structured,
            max_tokens: None,
        }
    }

    fn test_request() -> ClassifyRequest {
        ClassifyRequest {
            system_prompt: "classify".to_string(),
            payload: serde_json::json!(["one", "two"]),
            schema_name: "test_schema",
            schema: serde_json::json!({"type": "object"}),
            temperature: 0.2,
        }
    }

    #[test]
    fn test_strict_response_format_carries_schema() {
        let classifier = ChatClassifier::new("primary", test_config(true));
        let format = classifier.response_format(&test_request());

        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "test_schema");
        assert_eq!(format["json_schema"]["strict"], true);
    }

    #[test]
    fn test_json_object_mode_for_unstructured_gateways() {
        let classifier = ChatClassifier::new("auditor", test_config(false));
        let format = classifier.response_format(&test_request());

        assert_eq!(format, serde_json::json!({"type": "json_object"}));
    }
}
