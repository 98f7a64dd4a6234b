//! Quick rolls offered on the play screen

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Character;
use crate::domain::value_objects::Ability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickRoll {
    D20,
    Initiative,
    Attack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResult {
    pub kind: QuickRoll,
    pub natural: i32,
    pub modifier: i32,
    pub total: i32,
    /// Text the client drops into the action box, e.g. "D20 Roll: 14"
    pub label: String,
}

pub fn roll_die<R: Rng + ?Sized>(rng: &mut R, sides: u32) -> i32 {
    rng.gen_range(1..=sides.max(1)) as i32
}

pub fn quick_roll<R: Rng + ?Sized>(rng: &mut R, kind: QuickRoll, character: &Character) -> RollResult {
    let natural = roll_die(rng, 20);
    let (modifier, title) = match kind {
        QuickRoll::D20 => (0, "D20 Roll"),
        QuickRoll::Initiative => (character.initiative, "Initiative Roll"),
        QuickRoll::Attack => (character.ability_modifier(Ability::Strength), "Attack Roll"),
    };
    let total = natural.saturating_add(modifier);

    RollResult {
        kind,
        natural,
        modifier,
        total,
        label: format!("{}: {}", title, total),
    }
}
