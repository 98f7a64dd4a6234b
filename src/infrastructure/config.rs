//! Application configuration

use std::env;

use anyhow::{Context, Result};

use crate::application::ports::outbound::{ApiCredentials, ProviderKind};

/// Endpoint settings for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEndpoint {
    /// API base URL, without the trailing path
    pub base_url: String,
    pub model: String,
}

/// Settings shared by every provider adapter
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub openai: ProviderEndpoint,
    pub anthropic: ProviderEndpoint,
    pub deepseek: ProviderEndpoint,
    pub temperature: f32,
    /// Required by the tool-use API, ignored by the others
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn endpoint(&self, kind: ProviderKind) -> &ProviderEndpoint {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::DeepSeek => &self.deepseek,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai: ProviderEndpoint {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o".to_string(),
            },
            anthropic: ProviderEndpoint {
                base_url: "https://api.anthropic.com/v1".to_string(),
                model: "claude-3-5-sonnet-20241022".to_string(),
            },
            deepseek: ProviderEndpoint {
                base_url: "https://api.deepseek.com/v1".to_string(),
                model: "deepseek-chat".to_string(),
            },
            temperature: 0.9,
            max_tokens: 4096,
            request_timeout_secs: 120,
        }
    }
}

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string for the key-value store
    pub database_url: String,

    /// HTTP server port
    pub server_port: u16,

    /// Credentials from the environment; stored credentials take precedence
    pub default_credentials: Option<ApiCredentials>,

    pub providers: ProviderConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = ProviderConfig::default();

        let default_credentials = match (env::var("AIDM_PROVIDER"), env::var("AIDM_API_KEY")) {
            (Ok(provider), Ok(api_key)) if !api_key.is_empty() => {
                let kind: ProviderKind = provider
                    .parse()
                    .context("AIDM_PROVIDER must be one of openai, anthropic, deepseek")?;
                Some(ApiCredentials::new(kind, api_key))
            }
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://aidm.db?mode=rwc".to_string()),

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,

            default_credentials,

            providers: ProviderConfig {
                openai: endpoint_from_env("OPENAI", &defaults.openai),
                anthropic: endpoint_from_env("ANTHROPIC", &defaults.anthropic),
                deepseek: endpoint_from_env("DEEPSEEK", &defaults.deepseek),
                temperature: env::var("AIDM_TEMPERATURE")
                    .unwrap_or_else(|_| defaults.temperature.to_string())
                    .parse()
                    .context("AIDM_TEMPERATURE must be a number")?,
                max_tokens: env::var("AIDM_MAX_TOKENS")
                    .unwrap_or_else(|_| defaults.max_tokens.to_string())
                    .parse()
                    .context("AIDM_MAX_TOKENS must be a positive integer")?,
                request_timeout_secs: env::var("AIDM_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| defaults.request_timeout_secs.to_string())
                    .parse()
                    .context("AIDM_REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            },
        })
    }
}

fn endpoint_from_env(prefix: &str, default: &ProviderEndpoint) -> ProviderEndpoint {
    ProviderEndpoint {
        base_url: env::var(format!("{}_BASE_URL", prefix))
            .unwrap_or_else(|_| default.base_url.clone()),
        model: env::var(format!("{}_MODEL", prefix)).unwrap_or_else(|_| default.model.clone()),
    }
}
