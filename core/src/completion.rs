use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::{AssistantConfig, DEFAULT_COMPLETION_ENDPOINT, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::errors::{AssistantError, AssistantResult};
use crate::prompt::PromptEnvelope;
use crate::stream::{decode_fragments, FragmentStream};
use crate::types::CompletionRequest;

/// Anything that can turn a prompt into a stream of answer fragments
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Opens the stream. Errors here mean no data was received at all.
    async fn open_stream(&self, envelope: &PromptEnvelope) -> AssistantResult<FragmentStream>;
}

/// Client for an OpenAI-compatible streaming chat completion endpoint
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl CompletionClient {
    /// Create a new completion client
    pub fn new(config: &AssistantConfig, client: Client) -> AssistantResult<Self> {
        let api_key = config.completion_api_key.clone().ok_or_else(|| {
            AssistantError::ConfigError(
                "API key is required to initialize the completion client".to_string(),
            )
        })?;

        Ok(Self {
            client,
            endpoint: config
                .completion_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_COMPLETION_ENDPOINT.to_string()),
            api_key,
            model: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, envelope: &'a PromptEnvelope) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: envelope.messages(),
            temperature: self.temperature,
            stream: true,
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    #[instrument(skip(self, envelope), fields(model = %self.model))]
    async fn open_stream(&self, envelope: &PromptEnvelope) -> AssistantResult<FragmentStream> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(envelope))
            .send()
            .await
            .map_err(|e| AssistantError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                AssistantError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(AssistantError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        debug!(status = status.as_u16(), "Completion stream opened");
        Ok(decode_fragments(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use crate::prompt::assemble;

    #[test]
    fn requires_api_key() {
        let err = CompletionClient::new(&AssistantConfig::defaults(), Client::new()).unwrap_err();
        assert!(matches!(err, AssistantError::ConfigError(_)));
    }

    #[test]
    fn request_body_uses_config_and_streams() {
        let mut config = AssistantConfig::defaults();
        config.completion_api_key = Some("sk-test".into());
        config.temperature = Some(0.25);
        let client = CompletionClient::new(&config, Client::new()).unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);

        let envelope = assemble("Persona.", "", Locale::En, "hello");
        let body = serde_json::to_value(client.request_body(&envelope)).unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["stream"], true);
        assert_eq!(body["temperature"], 0.25);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error_not_a_panic() {
        let mut config = AssistantConfig::defaults();
        config.completion_api_key = Some("sk-test".into());
        // Port 9 (discard) on localhost is expected to refuse connections
        config.completion_endpoint = Some("http://127.0.0.1:9/v1/chat/completions".into());
        let client = CompletionClient::new(&config, Client::new()).unwrap();

        let envelope = assemble("Persona.", "", Locale::En, "hello");
        assert!(client.open_stream(&envelope).await.is_err());
    }
}
