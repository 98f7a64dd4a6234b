//! Domain entities - The game record the model reads and mutates

mod adventure;
mod character;
mod game_state;

pub use adventure::{AdventurePreferences, AdventureSession, Message, MessageRole};
pub use character::{
    AbilityScores, Character, HitDice, HitPoints, InventoryItem, Spell, SpellSlot,
};
pub use game_state::{Enemy, GameState};
