//! LLM port - Interface for the narrating language model
//!
//! The orchestrator only ever talks to a [`LlmProviderPort`]. Each vendor
//! adapter translates the uniform [`ProviderRequest`] into its own wire
//! format and normalizes the answer back into a [`ProviderReply`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::Message;
use crate::domain::value_objects::ToolSpec;

/// The known backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Function-calling style, one call per turn
    #[serde(rename = "openai")]
    OpenAi,
    /// Tool-use content blocks
    Anthropic,
    /// OpenAI-compatible with parallel tool calls
    #[serde(rename = "deepseek")]
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Anthropic, Self::DeepSeek];

    /// Wire identifier, as stored with the credentials
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::DeepSeek => "DeepSeek",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported provider: {0}")]
pub struct UnsupportedProviderError(pub String);

impl FromStr for ProviderKind {
    type Err = UnsupportedProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(UnsupportedProviderError(other.to_string())),
        }
    }
}

/// Provider selection plus the secret used to authenticate with it
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredentials {
    /// Kept as free text so a stored unknown provider surfaces as
    /// [`UnsupportedProviderError`] at turn time rather than as corruption
    pub provider: String,
    pub api_key: String,
}

impl ApiCredentials {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.as_str().to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn kind(&self) -> Result<ProviderKind, UnsupportedProviderError> {
        self.provider.parse()
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Vendor-neutral tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: Value,
}

impl From<&ToolSpec> for ToolDefinition {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            parameters: spec.input_schema(),
        }
    }
}

/// One tool call requested by the model, not yet validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Call-site identifier to echo back in the follow-up (absent for
    /// single-call function-calling responses)
    pub call_id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

/// Everything a provider needs for one request
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// Normalized provider answer
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    /// Narrative text, empty when the model only called tools
    pub narrative: String,
    pub tool_invocations: Vec<ToolInvocation>,
    /// The assistant turn exactly as the vendor returned it; replayed in
    /// the follow-up request
    pub assistant_record: Value,
}

impl ProviderReply {
    pub fn has_narrative(&self) -> bool {
        !self.narrative.trim().is_empty()
    }
}

/// Transport failures; all of them end the turn with the placeholder
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{provider} API error: {status}")]
    UpstreamApi { provider: ProviderKind, status: String },

    #[error("{provider} request failed: {message}")]
    RequestFailed { provider: ProviderKind, message: String },

    #[error("{provider} returned an unreadable response: {message}")]
    InvalidResponse { provider: ProviderKind, message: String },
}

/// Port for a single LLM backend
#[async_trait]
pub trait LlmProviderPort: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Send the conversation with the tool catalog attached
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, LlmError>;

    /// Ask for narration of tool calls that were already applied.
    ///
    /// `request` carries the context rebuilt from the post-tool state and
    /// `previous` is the reply whose tool calls are being acknowledged.
    async fn follow_up(
        &self,
        request: &ProviderRequest,
        previous: &ProviderReply,
    ) -> Result<ProviderReply, LlmError>;
}

/// Builds a provider for the credentials in effect for a turn
pub trait ProviderFactoryPort: Send + Sync {
    fn create(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<Arc<dyn LlmProviderPort>, UnsupportedProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("openai".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!(" Anthropic ".parse::<ProviderKind>(), Ok(ProviderKind::Anthropic));
        assert_eq!("deepseek".parse::<ProviderKind>(), Ok(ProviderKind::DeepSeek));
        assert_eq!(
            "gemini".parse::<ProviderKind>(),
            Err(UnsupportedProviderError("gemini".to_string()))
        );
    }

    #[test]
    fn test_credentials_shape() {
        let creds = ApiCredentials::new(ProviderKind::DeepSeek, "sk-test");
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json, serde_json::json!({"provider": "deepseek", "apiKey": "sk-test"}));
        assert!(!format!("{:?}", creds).contains("sk-test"));
    }

    #[test]
    fn test_reply_narrative_detection() {
        let reply = ProviderReply {
            narrative: "  \n".to_string(),
            tool_invocations: vec![],
            assistant_record: Value::Null,
        };
        assert!(!reply.has_narrative());
    }
}
