//! Save Service - Adventure persistence, import and export
//!
//! The adventure lives in the key-value store under one key per concern,
//! using the same key names and value shapes the browser client keeps in
//! its local storage. Whole-adventure writes go through a single batch so a
//! reader never observes half of a save or half of an import.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::application::dto::SaveDocument;
use crate::application::ports::outbound::{
    ApiCredentials, KeyValueStorePort, StorageError, StoreOp,
};
use crate::domain::entities::{
    AdventurePreferences, AdventureSession, Character, GameState, Message,
};

/// Store keys
pub mod keys {
    pub const CHARACTER: &str = "dnd_character";
    pub const GAME_STATE: &str = "dnd_game_state";
    pub const ADVENTURE_PREFS: &str = "dnd_adventure_prefs";
    pub const MESSAGES: &str = "dnd_messages";
    pub const HAS_OPENING: &str = "dnd_has_opening";
    pub const LAST_SAVE: &str = "dnd_last_save";
    pub const API_CONFIG: &str = "dnd_api_config";

    /// Everything "new game" wipes; credentials survive
    pub const ADVENTURE: [&str; 6] = [
        CHARACTER,
        GAME_STATE,
        ADVENTURE_PREFS,
        MESSAGES,
        HAS_OPENING,
        LAST_SAVE,
    ];
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Save data is corrupt: {0}")]
    PersistenceCorruption(String),

    #[error("No adventure in progress")]
    NoActiveAdventure,
}

/// Service for loading and storing the adventure
pub struct SaveService {
    store: Arc<dyn KeyValueStorePort>,
}

impl SaveService {
    pub fn new(store: Arc<dyn KeyValueStorePort>) -> Self {
        Self { store }
    }

    /// Load the stored adventure, if a character has been created
    #[instrument(skip(self))]
    pub async fn load_session(&self) -> Result<Option<AdventureSession>, SaveError> {
        let Some(character) = self.read_json::<Character>(keys::CHARACTER).await? else {
            return Ok(None);
        };

        let game_state = self
            .read_json::<GameState>(keys::GAME_STATE)
            .await?
            .unwrap_or_default();
        let preferences = self
            .read_json::<AdventurePreferences>(keys::ADVENTURE_PREFS)
            .await?
            .unwrap_or_default();
        let messages = self
            .read_json::<Vec<Message>>(keys::MESSAGES)
            .await?
            .unwrap_or_default();
        let has_opening = self
            .store
            .get(keys::HAS_OPENING)
            .await?
            .is_some_and(|flag| flag.trim() == "true");

        debug!("Loaded adventure with {} messages", messages.len());
        Ok(Some(AdventureSession {
            character,
            game_state,
            preferences,
            messages,
            has_opening,
        }))
    }

    /// Load the stored adventure or fail with [`SaveError::NoActiveAdventure`]
    pub async fn require_session(&self) -> Result<AdventureSession, SaveError> {
        self.load_session().await?.ok_or(SaveError::NoActiveAdventure)
    }

    /// Persist the whole adventure and stamp the save time, atomically
    #[instrument(skip(self, session))]
    pub async fn save_session(&self, session: &AdventureSession) -> Result<(), SaveError> {
        let ops = vec![
            StoreOp::set(keys::CHARACTER, to_json(&session.character)?),
            StoreOp::set(keys::GAME_STATE, to_json(&session.game_state)?),
            StoreOp::set(keys::ADVENTURE_PREFS, to_json(&session.preferences)?),
            StoreOp::set(keys::MESSAGES, to_json(&session.messages)?),
            StoreOp::set(keys::HAS_OPENING, session.has_opening.to_string()),
            StoreOp::set(keys::LAST_SAVE, Utc::now().to_rfc3339()),
        ];
        self.store.apply_batch(ops).await?;
        debug!("Saved adventure ({} messages)", session.messages.len());
        Ok(())
    }

    /// Replace any stored adventure with a fresh one
    pub async fn start_adventure(
        &self,
        character: Character,
        preferences: AdventurePreferences,
    ) -> Result<AdventureSession, SaveError> {
        let session = AdventureSession::new(character, preferences);
        self.save_session(&session).await?;
        info!("Started adventure for {}", session.character.name);
        Ok(session)
    }

    /// "New game": forget the adventure, keep the credentials
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), SaveError> {
        let ops = keys::ADVENTURE.iter().map(|key| StoreOp::remove(*key)).collect();
        self.store.apply_batch(ops).await?;
        info!("Cleared stored adventure");
        Ok(())
    }

    pub async fn export(&self) -> Result<SaveDocument, SaveError> {
        Ok(SaveDocument::from_session(self.require_session().await?))
    }

    /// Replace the stored adventure with an exported document
    ///
    /// Nothing is written unless the whole document parses.
    #[instrument(skip(self, document))]
    pub async fn import(&self, document: serde_json::Value) -> Result<AdventureSession, SaveError> {
        let document: SaveDocument = serde_json::from_value(document)
            .map_err(|e| SaveError::PersistenceCorruption(e.to_string()))?;
        let session = document.into_session();
        self.save_session(&session).await?;
        info!(
            "Imported adventure for {} ({} messages)",
            session.character.name,
            session.messages.len()
        );
        Ok(session)
    }

    pub async fn last_saved(&self) -> Result<Option<String>, SaveError> {
        Ok(self.store.get(keys::LAST_SAVE).await?)
    }

    pub async fn load_credentials(&self) -> Result<Option<ApiCredentials>, SaveError> {
        self.read_json(keys::API_CONFIG).await
    }

    pub async fn save_credentials(&self, credentials: &ApiCredentials) -> Result<(), SaveError> {
        self.store
            .set(keys::API_CONFIG, &to_json(credentials)?)
            .await?;
        info!("Stored credentials for provider {}", credentials.provider);
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SaveError> {
        match self.store.get(key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| SaveError::PersistenceCorruption(format!("{}: {}", key, e))),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, SaveError> {
    serde_json::to_string(value).map_err(|e| SaveError::PersistenceCorruption(e.to_string()))
}
