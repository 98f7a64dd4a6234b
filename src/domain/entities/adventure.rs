//! Adventure snapshot: the character, the world state, the player's stated
//! preferences and the conversation so far

use serde::{Deserialize, Serialize};

use super::{Character, GameState};

/// Who authored a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// One entry of the append-only conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Free-form preferences captured at character creation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdventurePreferences {
    pub backstory: String,
    pub adventure_description: String,
}

/// Everything a turn reads and writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureSession {
    pub character: Character,
    pub game_state: GameState,
    #[serde(rename = "adventurePreferences")]
    pub preferences: AdventurePreferences,
    pub messages: Vec<Message>,
    pub has_opening: bool,
}

impl AdventureSession {
    /// A fresh adventure: default game state, empty history, no opening yet
    pub fn new(character: Character, preferences: AdventurePreferences) -> Self {
        Self {
            character,
            game_state: GameState::default(),
            preferences,
            messages: Vec::new(),
            has_opening: false,
        }
    }

    /// The bootstrap turn runs only once, on an untouched history
    pub fn needs_opening(&self) -> bool {
        !self.has_opening && self.messages.is_empty()
    }
}
