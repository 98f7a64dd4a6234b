use serde::{Deserialize, Serialize};

use crate::application::services::{ToolExecutionResult, TurnOutcome, TurnPhase};
use crate::domain::entities::{
    AbilityScores, AdventurePreferences, AdventureSession, Character, GameState, Message,
};
use crate::domain::services::{NewCharacter, QuickRoll};

/// Character-creation inputs as the wizard submits them
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCharacterRequestDto {
    pub name: String,
    pub race: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub abilities: AbilityScores,
    #[serde(default)]
    pub spells: Vec<String>,
}

impl From<NewCharacterRequestDto> for NewCharacter {
    fn from(dto: NewCharacterRequestDto) -> Self {
        Self {
            name: dto.name,
            race: dto.race,
            class_name: dto.class_name,
            abilities: dto.abilities,
            spells: dto.spells,
        }
    }
}

/// Either a finished sheet or the inputs to derive one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CharacterSourceDto {
    Sheet { character: Box<Character> },
    Creation { creation: NewCharacterRequestDto },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAdventureRequestDto {
    #[serde(flatten)]
    pub source: CharacterSourceDto,
    #[serde(default)]
    pub preferences: AdventurePreferences,
}

#[derive(Debug, Deserialize)]
pub struct SubmitActionRequestDto {
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct QuickRollRequestDto {
    pub kind: QuickRoll,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureResponseDto {
    pub character: Character,
    pub game_state: GameState,
    pub adventure_preferences: AdventurePreferences,
    pub messages: Vec<Message>,
    pub has_opening: bool,
}

impl From<AdventureSession> for AdventureResponseDto {
    fn from(session: AdventureSession) -> Self {
        Self {
            character: session.character,
            game_state: session.game_state,
            adventure_preferences: session.preferences,
            messages: session.messages,
            has_opening: session.has_opening,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponseDto {
    pub narrative: String,
    pub tool_results: Vec<ToolExecutionResult>,
    pub phases: Vec<TurnPhase>,
    pub follow_up_sent: bool,
    /// Set when the turn ended with the placeholder message
    pub upstream_error: Option<String>,
    pub adventure: AdventureResponseDto,
}

impl From<TurnOutcome> for TurnResponseDto {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            narrative: outcome.narrative,
            tool_results: outcome.tool_results,
            phases: outcome.phases,
            follow_up_sent: outcome.follow_up_sent,
            upstream_error: outcome.upstream_error,
            adventure: AdventureResponseDto::from(outcome.session),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatusDto {
    pub last_saved: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsStatusDto {
    pub provider: Option<String>,
    pub configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentialsRequestDto {
    pub provider: String,
    pub api_key: String,
}
