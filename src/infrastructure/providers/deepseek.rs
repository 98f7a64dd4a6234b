//! DeepSeek adapter (OpenAI-compatible tools API)
//!
//! Tools are wrapped as `{type: "function", function}` and a reply may carry
//! several `tool_calls`, each with an id that the follow-up must echo in a
//! `tool` role message.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{chat_messages, decode_arguments, first_choice, send_json, ProviderSettings, TOOL_ACK};
use crate::application::ports::outbound::{
    LlmError, LlmProviderPort, ProviderKind, ProviderReply, ProviderRequest, ToolInvocation,
};

const KIND: ProviderKind = ProviderKind::DeepSeek;

pub struct DeepSeekProvider {
    client: Client,
    settings: ProviderSettings,
}

impl DeepSeekProvider {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    async fn post(&self, body: &Value) -> Result<ProviderReply, LlmError> {
        let request = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .bearer_auth(&self.settings.api_key);
        let response = send_json(KIND, request, body).await?;
        parse_response(response)
    }
}

#[async_trait]
impl LlmProviderPort for DeepSeekProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    #[instrument(skip(self, request), fields(model = %self.settings.model))]
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, LlmError> {
        let body = build_request(&self.settings, request);
        let reply = self.post(&body).await?;
        debug!(
            "DeepSeek replied with {} chars and {} tool calls",
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

pub(super) fn build_request(settings: &ProviderSettings, request: &ProviderRequest) -> Value {
    let tools: Vec<Value> = request
        .tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })
        })
        .collect();

    json!({
        "model": settings.model,
        "messages": chat_messages(&request.system_prompt, &request.messages),
        "tools": tools,
        "temperature": settings.temperature,
    })
}

pub(super) fn build_follow_up_request(
    settings: &ProviderSettings,
    request: &ProviderRequest,
    previous: &ProviderReply,
) -> Value {
    let mut messages = chat_messages(&request.system_prompt, &request.messages);
    messages.push(previous.assistant_record.clone());
    messages.extend(previous.tool_invocations.iter().map(|call| {
        json!({
            "role": "tool",
            "tool_call_id": call.call_id,
            "content": TOOL_ACK,
        })
    }));

    json!({
        "model": settings.model,
        "messages": messages,
        "temperature": settings.temperature,
    })
}

pub(super) fn parse_response(body: Value) -> Result<ProviderReply, LlmError> {
    let (message, record) = first_choice(KIND, body)?;

    let tool_invocations = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolInvocation {
            call_id: Some(call.id),
            arguments: decode_arguments(&call.function.arguments),
            name: call.function.name,
        })
        .collect();

    Ok(ProviderReply {
        narrative: message.content.unwrap_or_default(),
        tool_invocations,
        assistant_record: record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::ToolDefinition;
    use crate::domain::entities::Message;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            base_url: "https://api.deepseek.com/v1".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: "sk-test".to_string(),
            temperature: 0.9,
            max_tokens: 4096,
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            system_prompt: "You are the DM".to_string(),
            messages: vec![Message::user("I search the body")],
            tools: vec![ToolDefinition {
                name: "add_inventory_item".to_string(),
                description: "Add an item".to_string(),
                parameters: json!({"type": "object"}),
            }],
        }
    }

    fn multi_call_response() -> Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [
                        {
                            "id": "call_a",
                            "type": "function",
                            "function": {
                                "name": "add_inventory_item",
                                "arguments": "{\"name\":\"Dagger\",\"type\":\"weapon\",\"quantity\":1,\"description\":\"Rusty\"}"
                            }
                        },
                        {
                            "id": "call_b",
                            "type": "function",
                            "function": {"name": "add_experience", "arguments": "{\"amount\":50}"}
                        }
                    ]
                }
            }]
        })
    }

    #[test]
    fn test_request_wraps_tools() {
        let body = build_request(&settings(), &request());

        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "add_inventory_item");
        assert!(body.get("functions").is_none());
        assert_eq!(body["messages"][0]["content"], "You are the DM");
    }

    #[test]
    fn test_parse_multiple_tool_calls() {
        let reply = parse_response(multi_call_response()).unwrap();

        assert!(!reply.has_narrative());
        assert_eq!(reply.tool_invocations.len(), 2);
        assert_eq!(reply.tool_invocations[0].call_id.as_deref(), Some("call_a"));
        assert_eq!(reply.tool_invocations[1].arguments, json!({"amount": 50}));
    }

    #[test]
    fn test_follow_up_echoes_call_ids() {
        let previous = parse_response(multi_call_response()).unwrap();
        let body = build_follow_up_request(&settings(), &request(), &previous);
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[2]["tool_calls"][1]["id"], "call_b");
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_a");
        assert_eq!(messages[4]["tool_call_id"], "call_b");
        assert_eq!(messages[4]["content"], TOOL_ACK);
        assert!(body.get("tools").is_none());
    }
}
