//! Application services - Use case implementations
//!
//! This module contains the application services that implement the use cases
//! of the engine. Each service follows hexagonal architecture principles,
//! depending only on outbound ports and returning domain entities or DTOs.

pub mod conversation_service;
pub mod llm;
pub mod save_service;
pub mod tool_execution_service;

pub use conversation_service::{
    ConversationError, ConversationService, TurnOutcome, TurnPhase, FALLBACK_NARRATIVE,
    OPENING_FAILED_MESSAGE, TURN_FAILED_MESSAGE,
};
pub use save_service::{SaveError, SaveService};
pub use tool_execution_service::{StateChange, ToolExecutionResult, ToolExecutionService};
