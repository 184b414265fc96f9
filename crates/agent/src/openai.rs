//! OpenAI-compatible chat-completions client. Also used for Ollama, which
//! serves the same wire format under `/v1`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stayfinder_core::config::LlmConfig;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError, ToolChoice};

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OpenAiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: completions_endpoint(&config.base_url),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: ChatMessage,
}

fn build_wire_request<'a>(model: &'a str, request: &CompletionRequest<'a>) -> WireRequest<'a> {
    WireRequest {
        model,
        messages: request.messages,
        tools: request.tools.iter().map(|spec| spec.to_openai()).collect(),
        tool_choice: if request.offers_tools() { request.tool_choice } else { None },
    }
}

fn first_choice(body: &str) -> Result<ChatMessage, LlmError> {
    let response: WireResponse =
        serde_json::from_str(body).map_err(|error| LlmError::Decode(error.to_string()))?;
    response.choices.into_iter().next().map(|choice| choice.message).ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<ChatMessage, LlmError> {
        let payload = build_wire_request(&self.model, &request);
        debug!(
            event_name = "llm.request.sent",
            model = %self.model,
            messages = request.messages.len(),
            tools = payload.tools.len(),
            "sending completion request"
        );

        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|error| {
            warn!(event_name = "llm.request.failed", error = %error, "completion request failed");
            LlmError::Transport(error.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| LlmError::Transport(error.to_string()))?;
        if !status.is_success() {
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        first_choice(&body)
    }
}
