//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::application::ports::outbound::{
    ApiCredentials, KeyValueStorePort, ProviderFactoryPort,
};
use crate::application::services::{ConversationService, SaveError, SaveService};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::SqliteKeyValueStore;
use crate::infrastructure::providers::HttpProviderFactory;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub save_service: SaveService,
    pub conversation_service: ConversationService,
    pub providers: Arc<dyn ProviderFactoryPort>,
    /// Held for the whole of a turn, an opening or any other write to the
    /// adventure; at most one runs at a time
    pub turn_lock: Mutex<()>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = SqlitePool::connect(&config.database_url)
            .await
            .context("Failed to connect to SQLite database")?;
        let store = SqliteKeyValueStore::new(pool)
            .await
            .context("Failed to initialise key-value store")?;

        let providers = HttpProviderFactory::new(config.providers.clone())
            .context("Failed to build LLM HTTP client")?;

        Ok(Self::with_parts(config, Arc::new(store), Arc::new(providers)))
    }

    /// Assemble state around explicit adapters
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn KeyValueStorePort>,
        providers: Arc<dyn ProviderFactoryPort>,
    ) -> Self {
        Self {
            config,
            save_service: SaveService::new(store),
            conversation_service: ConversationService::new(),
            providers,
            turn_lock: Mutex::new(()),
        }
    }

    /// Stored credentials, falling back to the ones from the environment
    pub async fn active_credentials(&self) -> Result<Option<ApiCredentials>, SaveError> {
        Ok(self
            .save_service
            .load_credentials()
            .await?
            .or_else(|| self.config.default_credentials.clone()))
    }
}
