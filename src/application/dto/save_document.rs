//! The import/export document
//!
//! One JSON file bundles the whole adventure. Older exports stored the
//! message history as a JSON-encoded string and the opening flag as the
//! string `"true"`; both shapes are accepted on import.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::entities::{
    AdventurePreferences, AdventureSession, Character, GameState, Message,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    pub character: Character,
    pub game_state: GameState,
    #[serde(default)]
    pub adventure_preferences: AdventurePreferences,
    #[serde(default, deserialize_with = "lenient::messages")]
    pub messages: Vec<Message>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_opening: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl SaveDocument {
    /// Snapshot a session for export, stamped with the current time
    pub fn from_session(session: AdventureSession) -> Self {
        Self {
            character: session.character,
            game_state: session.game_state,
            adventure_preferences: session.preferences,
            messages: session.messages,
            has_opening: session.has_opening,
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    pub fn into_session(self) -> AdventureSession {
        AdventureSession {
            character: self.character,
            game_state: self.game_state,
            preferences: self.adventure_preferences,
            messages: self.messages,
            has_opening: self.has_opening,
        }
    }
}

mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MessagesField {
        List(Vec<Message>),
        Encoded(String),
    }

    pub fn messages<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Message>, D::Error> {
        match Option::<MessagesField>::deserialize(deserializer)? {
            None => Ok(Vec::new()),
            Some(MessagesField::List(list)) => Ok(list),
            Some(MessagesField::Encoded(text)) if text.trim().is_empty() => Ok(Vec::new()),
            Some(MessagesField::Encoded(text)) => {
                serde_json::from_str(&text).map_err(serde::de::Error::custom)
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagField {
        Bool(bool),
        Text(String),
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Option::<FlagField>::deserialize(deserializer)? {
            None => false,
            Some(FlagField::Bool(b)) => b,
            Some(FlagField::Text(s)) => s.trim().eq_ignore_ascii_case("true"),
        })
    }
}
