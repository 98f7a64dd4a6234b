//! OpenAI function-calling adapter
//!
//! Tools are sent as a flat `functions` list; the model may answer with at
//! most one `function_call` per turn. The follow-up replays that assistant
//! message and acknowledges it with a `function` role message.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{chat_messages, decode_arguments, first_choice, send_json, ProviderSettings, TOOL_ACK};
use crate::application::ports::outbound::{
    LlmError, LlmProviderPort, ProviderKind, ProviderReply, ProviderRequest, ToolInvocation,
};

const KIND: ProviderKind = ProviderKind::OpenAi;

pub struct OpenAiProvider {
    client: Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
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
impl LlmProviderPort for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    #[instrument(skip(self, request), fields(model = %self.settings.model))]
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, LlmError> {
        let body = build_request(&self.settings, request);
        let reply = self.post(&body).await?;
        debug!(
            "OpenAI replied with {} chars and {} function calls",
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
    let functions: Vec<Value> = request
        .tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            })
        })
        .collect();

    json!({
        "model": settings.model,
        "messages": chat_messages(&request.system_prompt, &request.messages),
        "functions": functions,
        "function_call": "auto",
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
    if let Some(call) = previous.tool_invocations.first() {
        messages.push(json!({
            "role": "function",
            "name": call.name,
            "content": TOOL_ACK,
        }));
    }

    json!({
        "model": settings.model,
        "messages": messages,
        "temperature": settings.temperature,
    })
}

pub(super) fn parse_response(body: Value) -> Result<ProviderReply, LlmError> {
    let (message, record) = first_choice(KIND, body)?;

    let tool_invocations = message
        .function_call
        .into_iter()
        .map(|call| ToolInvocation {
            call_id: None,
            arguments: decode_arguments(&call.arguments),
            name: call.name,
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
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: "sk-test".to_string(),
            temperature: 0.9,
            max_tokens: 4096,
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            system_prompt: "You are the DM".to_string(),
            messages: vec![Message::user("I attack the goblin")],
            tools: vec![ToolDefinition {
                name: "modify_hp".to_string(),
                description: "Change HP".to_string(),
                parameters: json!({"type": "object"}),
            }],
        }
    }

    #[test]
    fn test_request_shape() {
        let body = build_request(&settings(), &request());

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["function_call"], "auto");
        assert_eq!(body["functions"][0]["name"], "modify_hp");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "I attack the goblin");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_function_call() {
        let reply = parse_response(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {"name": "modify_hp", "arguments": "{\"amount\": -4}"}
                },
                "finish_reason": "function_call"
            }]
        }))
        .unwrap();

        assert!(!reply.has_narrative());
        assert_eq!(reply.tool_invocations.len(), 1);
        assert_eq!(reply.tool_invocations[0].name, "modify_hp");
        assert_eq!(reply.tool_invocations[0].arguments, json!({"amount": -4}));
        assert_eq!(reply.assistant_record["function_call"]["name"], "modify_hp");
    }

    #[test]
    fn test_parse_plain_text() {
        let reply = parse_response(json!({
            "choices": [{"message": {"role": "assistant", "content": "The goblin flees."}}]
        }))
        .unwrap();

        assert_eq!(reply.narrative, "The goblin flees.");
        assert!(reply.tool_invocations.is_empty());
    }

    #[test]
    fn test_follow_up_acknowledges_function() {
        let previous = parse_response(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": {"name": "modify_hp", "arguments": "{\"amount\": -4}"}
                }
            }]
        }))
        .unwrap();

        let body = build_follow_up_request(&settings(), &request(), &previous);
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2]["function_call"]["name"], "modify_hp");
        assert_eq!(
            messages[3],
            json!({"role": "function", "name": "modify_hp", "content": "{\"success\":true}"})
        );
        assert!(body.get("functions").is_none());
    }
}
