//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite and in-memory key-value stores
//! - HTTP: REST API routes
//! - Providers: OpenAI, Anthropic and DeepSeek adapters
//! - Config: Application configuration
//! - State: Shared application state

pub mod config;
pub mod http;
pub mod persistence;
pub mod providers;
pub mod state;
