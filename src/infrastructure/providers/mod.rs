//! LLM provider adapters
//!
//! One adapter per vendor wire protocol. Each adapter is split into pure
//! request-building and response-parsing functions plus a thin async shell
//! that performs the HTTP exchange through [`send_json`].

mod anthropic;
mod deepseek;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::application::ports::outbound::{
    ApiCredentials, LlmError, LlmProviderPort, ProviderFactoryPort, ProviderKind,
    UnsupportedProviderError,
};
use crate::domain::entities::{Message, MessageRole};
use crate::infrastructure::config::ProviderConfig;

pub use anthropic::AnthropicProvider;
pub use deepseek::DeepSeekProvider;
pub use openai::OpenAiProvider;

/// Acknowledgement sent back for every applied tool call
pub const TOOL_ACK: &str = r#"{"success":true}"#;

/// Builds the adapter matching the credentials of the current turn
pub struct HttpProviderFactory {
    client: Client,
    config: ProviderConfig,
}

impl HttpProviderFactory {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }
}

impl ProviderFactoryPort for HttpProviderFactory {
    fn create(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<Arc<dyn LlmProviderPort>, UnsupportedProviderError> {
        let kind = credentials.kind()?;
        let settings = ProviderSettings {
            base_url: self
                .config
                .endpoint(kind)
                .base_url
                .trim_end_matches('/')
                .to_string(),
            model: self.config.endpoint(kind).model.clone(),
            api_key: credentials.api_key.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        debug!(provider = %kind, model = %settings.model, "Creating provider adapter");

        let provider: Arc<dyn LlmProviderPort> = match kind {
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(self.client.clone(), settings)),
            ProviderKind::Anthropic => {
                Arc::new(AnthropicProvider::new(self.client.clone(), settings))
            }
            ProviderKind::DeepSeek => {
                Arc::new(DeepSeekProvider::new(self.client.clone(), settings))
            }
        };
        Ok(provider)
    }
}

/// Per-request settings handed to an adapter
#[derive(Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// POST a JSON body and decode the JSON answer
async fn send_json(
    provider: ProviderKind,
    request: RequestBuilder,
    body: &Value,
) -> Result<Value, LlmError> {
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::RequestFailed {
            provider,
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!(%provider, %status, "Upstream rejected request: {}", truncate(&error_text, 500));
        return Err(LlmError::UpstreamApi {
            provider,
            status: status.to_string(),
        });
    }

    response.json().await.map_err(|e| LlmError::InvalidResponse {
        provider,
        message: e.to_string(),
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    }
}

/// System prompt followed by the history, in chat-completions shape
fn chat_messages(system_prompt: &str, history: &[Message]) -> Vec<Value> {
    std::iter::once(json!({ "role": "system", "content": system_prompt }))
        .chain(history.iter().map(|message| {
            json!({ "role": role_name(message.role), "content": message.content })
        }))
        .collect()
}

/// Tool-call arguments arrive as a JSON-encoded string. Text that is not
/// JSON is kept as a string so the registry rejects it as malformed.
fn decode_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

// =============================================================================
// Chat-completions response types, shared by the OpenAI-style adapters
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatToolCall {
    id: String,
    function: FunctionCall,
}

/// Decode the first choice and return it with its raw message record
fn first_choice(provider: ProviderKind, body: Value) -> Result<(ChatMessage, Value), LlmError> {
    let record = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .cloned()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider,
            message: "No choices in LLM response".to_string(),
        })?;

    let response: ChatResponse =
        serde_json::from_value(body).map_err(|e| LlmError::InvalidResponse {
            provider,
            message: e.to_string(),
        })?;
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .unwrap_or_default();

    Ok((message, record))
}
