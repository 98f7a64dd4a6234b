//! Outbound ports - Interfaces that the application requires from external systems

mod llm_port;
mod storage_port;

pub use llm_port::{
    ApiCredentials, LlmError, LlmProviderPort, ProviderFactoryPort, ProviderKind, ProviderReply,
    ProviderRequest, ToolDefinition, ToolInvocation, UnsupportedProviderError,
};
pub use storage_port::{KeyValueStorePort, StorageError, StoreOp};
