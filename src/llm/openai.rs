//! OpenAI-compatible chat-completions provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Retries for transient failures (connection errors, 429, 5xx).
const MAX_RETRIES: u32 = 2;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Provider speaking the OpenAI `/chat/completions` wire format.
///
/// Works against any API-compatible service via `with_base_url`.
pub struct OpenAiProvider {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at an API-compatible service.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_body(&self, request: &CompletionRequest) -> WireRequest {
        WireRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m: &ChatMessage| WireMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_body(&request);
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying completion request"
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header(
                    "Authorization",
                    format!("Bearer {}", self.api_key.expose_secret()),
                )
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(LlmError::RequestFailed {
                        provider: "openai".to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let data: WireResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| LlmError::InvalidResponse {
                            provider: "openai".to_string(),
                            reason: format!("body decode failed: {e}"),
                        })?;
                return into_completion(data);
            }

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LlmError::AuthFailed {
                    provider: "openai".to_string(),
                });
            }

            let retryable = status.as_u16() == 429 || status.is_server_error();
            let detail = response.text().await.unwrap_or_default();
            let error = if status.as_u16() == 429 {
                LlmError::RateLimited {
                    provider: "openai".to_string(),
                    retry_after: None,
                }
            } else {
                LlmError::RequestFailed {
                    provider: "openai".to_string(),
                    reason: format!("HTTP {status}: {detail}"),
                }
            };

            if !retryable {
                return Err(error);
            }
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| LlmError::RequestFailed {
            provider: "openai".to_string(),
            reason: "request failed after retries".to_string(),
        }))
    }
}

fn into_completion(data: WireResponse) -> Result<CompletionResponse, LlmError> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: "openai".to_string(),
            reason: "no choices in response".to_string(),
        })?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("stop") | None => FinishReason::Stop,
        Some("length") => FinishReason::MaxTokens,
        Some(_) => FinishReason::Other,
    };

    let (input_tokens, output_tokens) = data
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        input_tokens,
        output_tokens,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_request_omits_unset_options() {
        let provider = OpenAiProvider::new(SecretString::from("test-key"), "gpt-4o");
        let body = provider.build_body(&CompletionRequest::new(vec![ChatMessage::user("hi")]));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn wire_request_includes_set_options() {
        let provider = OpenAiProvider::new(SecretString::from("test-key"), "gpt-4o");
        let request = CompletionRequest::new(vec![ChatMessage::system("s")])
            .with_temperature(0.1)
            .with_max_tokens(512);
        let json = serde_json::to_value(provider.build_body(&request)).unwrap();
        let temperature = json["temperature"].as_f64().unwrap();
        assert!((temperature - 0.1).abs() < 1e-6);
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn response_maps_content_and_usage() {
        let raw = r#"{
            "choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let data: WireResponse = serde_json::from_str(raw).unwrap();
        let completion = into_completion(data).unwrap();
        assert_eq!(completion.content, "hello");
        assert_eq!(completion.input_tokens, 12);
        assert_eq!(completion.output_tokens, 3);
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn response_without_choices_is_invalid() {
        let data: WireResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            into_completion(data),
            Err(LlmError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn length_finish_reason_maps_to_max_tokens() {
        let raw = r#"{"choices": [{"message": {"content": "x"}, "finish_reason": "length"}]}"#;
        let data: WireResponse = serde_json::from_str(raw).unwrap();
        let completion = into_completion(data).unwrap();
        assert_eq!(completion.finish_reason, FinishReason::MaxTokens);
        assert_eq!(completion.input_tokens, 0);
    }
}
