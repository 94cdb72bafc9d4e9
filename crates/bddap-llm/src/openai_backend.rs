//! OpenAI-compatible chat completions backend
//!
//! Serves both the public OpenAI API and Azure OpenAI deployments; the two
//! differ only in endpoint URL and auth header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

/// Default OpenAI API endpoint
pub(crate) const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Azure API version used when none is configured
pub(crate) const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";

/// Where requests go and how they authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    OpenAi {
        base_url: String,
    },
    Azure {
        instance: String,
        deployment: String,
        api_version: String,
    },
}

impl Endpoint {
    pub(crate) fn url(&self) -> String {
        match self {
            Endpoint::OpenAi { base_url } => base_url.clone(),
            Endpoint::Azure {
                instance,
                deployment,
                api_version,
            } => format!(
                "https://{instance}.openai.azure.com/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
            ),
        }
    }

    pub(crate) fn provider(&self) -> &'static str {
        match self {
            Endpoint::OpenAi { .. } => "openai",
            Endpoint::Azure { .. } => "azure-openai",
        }
    }
}

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAiBackend {
    client: HttpClient,
    endpoint: Endpoint,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Create a backend. `temperature` is the run's variability and never
    /// changes afterwards.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if the HTTP client cannot be built
    pub fn new(
        endpoint: Endpoint,
        api_key: String,
        model: String,
        temperature: f64,
        max_tokens: Option<u32>,
    ) -> Result<Self, String> {
        Ok(Self {
            client: HttpClient::new()?,
            endpoint,
            api_key,
            model,
            temperature,
            max_tokens,
        })
    }

    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|msg| OpenAiMessage {
                role: match msg.role {
                    Role::System => "system".to_string(),
                    Role::Human => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    fn build_request(&self, inv: &LlmInvocation) -> OpenAiRequest {
        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .or(self.max_tokens);

        OpenAiRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(&inv.messages),
            temperature: self.temperature,
            max_tokens,
        }
    }

    /// Extract the reply text and token usage from a response body.
    fn parse_response(
        provider: &str,
        model: &str,
        body: OpenAiResponse,
    ) -> Result<LlmResult, LlmError> {
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                LlmError::InvalidResponse(format!("{provider} response missing message content"))
            })?;

        let mut result = LlmResult::new(content, provider, body.model.as_deref().unwrap_or(model));
        if let Some(usage) = body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }
        Ok(result)
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let provider = self.endpoint.provider();
        let body = self.build_request(&inv);

        debug!(
            provider = provider,
            model = %self.model,
            purpose = %inv.purpose,
            messages = inv.messages.len(),
            temperature = self.temperature,
            "Invoking chat backend"
        );

        let request = self
            .client
            .inner()
            .post(self.endpoint.url())
            .header("content-type", "application/json")
            .json(&body);
        let request = match &self.endpoint {
            Endpoint::OpenAi { .. } => request.bearer_auth(&self.api_key),
            Endpoint::Azure { .. } => request.header("api-key", &self.api_key),
        };

        let response = self.client.execute(request, inv.timeout, provider).await?;

        let response_body: OpenAiResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse {provider} response: {e}"))
        })?;

        let result = Self::parse_response(provider, &self.model, response_body)?;

        debug!(
            provider = provider,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Chat backend invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend(endpoint: Endpoint) -> OpenAiBackend {
        OpenAiBackend::new(endpoint, "test-key".to_string(), "gpt-test".to_string(), 0.0, None)
            .unwrap()
    }

    #[test]
    fn test_human_role_maps_to_user() {
        let converted = OpenAiBackend::convert_messages(&[
            Message::system("be a persona"),
            Message::human("hi"),
            Message::assistant("hello"),
        ]);
        let roles: Vec<_> = converted.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
    }

    #[test]
    fn test_azure_url() {
        let endpoint = Endpoint::Azure {
            instance: "acme".to_string(),
            deployment: "poems".to_string(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        };
        assert_eq!(
            endpoint.url(),
            "https://acme.openai.azure.com/openai/deployments/poems/chat/completions?api-version=2023-05-15"
        );
        assert_eq!(endpoint.provider(), "azure-openai");
    }

    #[test]
    fn test_request_carries_fixed_temperature_and_metadata_max_tokens() {
        let backend = OpenAiBackend::new(
            Endpoint::OpenAi {
                base_url: DEFAULT_OPENAI_URL.to_string(),
            },
            "k".to_string(),
            "gpt-test".to_string(),
            0.7,
            Some(256),
        )
        .unwrap();

        let inv = LlmInvocation::new("test", vec![Message::human("hi")]);
        let body = serde_json::to_value(backend.build_request(&inv)).unwrap();
        assert_eq!(body["temperature"], json!(0.7));
        assert_eq!(body["max_tokens"], json!(256));

        let inv = inv.with_metadata("max_tokens", json!(16));
        let body = serde_json::to_value(backend.build_request(&inv)).unwrap();
        assert_eq!(body["max_tokens"], json!(16));
    }

    #[test]
    fn test_parse_response_extracts_text_and_usage() {
        let body: OpenAiResponse = serde_json::from_value(json!({
            "model": "gpt-test-2024",
            "choices": [{"message": {"role": "assistant", "content": "roses are red"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        }))
        .unwrap();

        let result = OpenAiBackend::parse_response("openai", "gpt-test", body).unwrap();
        assert_eq!(result.raw_response, "roses are red");
        assert_eq!(result.model_used, "gpt-test-2024");
        assert_eq!(result.tokens_input, Some(12));
        assert_eq!(result.tokens_output, Some(4));
    }

    #[test]
    fn test_parse_response_without_content_is_invalid() {
        let body: OpenAiResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert!(matches!(
            OpenAiBackend::parse_response("openai", "gpt-test", body),
            Err(LlmError::InvalidResponse(_))
        ));

        let body: OpenAiResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(OpenAiBackend::parse_response("openai", "gpt-test", body).is_err());
    }

    #[test]
    fn test_debug_does_not_print_api_key() {
        let backend = backend(Endpoint::OpenAi {
            base_url: DEFAULT_OPENAI_URL.to_string(),
        });
        assert!(!format!("{backend:?}").contains("test-key"));
    }
}
