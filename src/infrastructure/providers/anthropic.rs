//! Anthropic tool-use adapter
//!
//! Tools are sent as `{name, description, input_schema}`. The reply is a
//! list of content blocks mixing text and `tool_use`; several tool calls and
//! narrative text may arrive together. The follow-up replays the assistant
//! blocks, answers every `tool_use` with a `tool_result`, and asks for a
//! description of what happened.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{role_name, send_json, ProviderSettings, TOOL_ACK};
use crate::application::ports::outbound::{
    LlmError, LlmProviderPort, ProviderKind, ProviderReply, ProviderRequest, ToolInvocation,
};
use crate::domain::entities::{Message, MessageRole};

const KIND: ProviderKind = ProviderKind::Anthropic;

pub const API_VERSION: &str = "2023-06-01";

pub const FOLLOW_UP_PROMPT: &str = "Please describe what just happened.";

pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
}

impl AnthropicProvider {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    async fn post(&self, body: &Value) -> Result<ProviderReply, LlmError> {
        let request = self
            .client
            .post(format!("{}/messages", self.settings.base_url))
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", API_VERSION);
        let response = send_json(KIND, request, body).await?;
        parse_response(response)
    }
}

#[async_trait]
impl LlmProviderPort for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    #[instrument(skip(self, request), fields(model = %self.settings.model))]
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, LlmError> {
        let body = build_request(&self.settings, request);
        let reply = self.post(&body).await?;
        debug!(
            "Anthropic replied with {} chars and {} tool uses",
            reply.narrative.len(),
            reply.tool_invocations.len()
        );
        Ok(reply)
    }

    #[instrument(skip(self, request, previous), fields(model = %self.settings.model))]
    async fn follow_up(
        &self,
        request: &ProviderRequest,
        previous: &ProviderReply,
    ) -> Result<ProviderReply, LlmError> {
        let body = build_follow_up_request(&self.settings, request, previous);
        self.post(&body).await
    }
}

/// System messages travel in the top-level `system` field, not the history
fn conversation(history: &[Message]) -> Vec<Value> {
    history
        .iter()
        .filter(|message| message.role != MessageRole::System)
        .map(|message| json!({ "role": role_name(message.role), "content": message.content }))
        .collect()
}

fn tool_schemas(request: &ProviderRequest) -> Vec<Value> {
    request
        .tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.parameters,
            })
        })
        .collect()
}

pub(super) fn build_request(settings: &ProviderSettings, request: &ProviderRequest) -> Value {
    json!({
        "model": settings.model,
        "max_tokens": settings.max_tokens,
        "system": request.system_prompt,
        "messages": conversation(&request.messages),
        "tools": tool_schemas(request),
        "temperature": settings.temperature,
    })
}

pub(super) fn build_follow_up_request(
    settings: &ProviderSettings,
    request: &ProviderRequest,
    previous: &ProviderReply,
) -> Value {
    let mut answer: Vec<Value> = previous
        .tool_invocations
        .iter()
        .filter_map(|call| call.call_id.as_ref())
        .map(|id| {
            json!({
                "type": "tool_result",
                "tool_use_id": id,
                "content": TOOL_ACK,
            })
        })
        .collect();
    answer.push(json!({ "type": "text", "text": FOLLOW_UP_PROMPT }));

    let mut messages = conversation(&request.messages);
    messages.push(json!({ "role": "assistant", "content": previous.assistant_record }));
    messages.push(json!({ "role": "user", "content": answer }));

    json!({
        "model": settings.model,
        "max_tokens": settings.max_tokens,
        "system": request.system_prompt,
        "messages": messages,
        "tools": tool_schemas(request),
        "tool_choice": { "type": "none" },
        "temperature": settings.temperature,
    })
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

pub(super) fn parse_response(body: Value) -> Result<ProviderReply, LlmError> {
    let record = body.get("content").cloned().unwrap_or_else(|| json!([]));
    let response: MessagesResponse =
        serde_json::from_value(body).map_err(|e| LlmError::InvalidResponse {
            provider: KIND,
            message: e.to_string(),
        })?;

    let mut narrative = String::new();
    let mut tool_invocations = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::Text { text } => narrative.push_str(&text),
            ContentBlock::ToolUse { id, name, input } => tool_invocations.push(ToolInvocation {
                call_id: Some(id),
                name,
                arguments: input,
            }),
            ContentBlock::Other => {}
        }
    }

    Ok(ProviderReply {
        narrative,
        tool_invocations,
        assistant_record: record,
    })
}
