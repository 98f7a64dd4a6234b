//! Player character sheet
//!
//! The serialized shape (camelCase keys, `class`, `hitPoints`, spell slots
//! keyed by level) is shared with the browser client and with exported save
//! files, so field names here are part of the wire contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ability_modifier, Ability, ItemId};

/// The player character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub name: String,
    pub race: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub level: u32,
    pub experience: i64,
    pub experience_to_next_level: i64,

    pub abilities: AbilityScores,
    pub hit_points: HitPoints,

    pub armor_class: i32,
    pub initiative: i32,
    pub speed: i32,
    pub proficiency_bonus: i32,
    pub hit_dice: HitDice,

    /// Slot counts keyed by spell level (1-9)
    #[serde(default)]
    pub spell_slots: BTreeMap<u8, SpellSlot>,
    #[serde(default)]
    pub skills: BTreeMap<String, i32>,
    #[serde(default)]
    pub saving_throws: AbilityScores,

    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub spells: Vec<Spell>,
    /// Active conditions, no duplicates
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Character {
    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.abilities.get(ability))
    }

    pub fn find_item(&self, name: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|item| item.name == name)
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.iter().any(|c| c == condition)
    }
}

/// Six ability values; also used for saving-throw bonuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityScores {
    pub fn uniform(value: i32) -> Self {
        Self {
            strength: value,
            dexterity: value,
            constitution: value,
            intelligence: value,
            wisdom: value,
            charisma: value,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    /// Replace every score by its modifier
    pub fn modifiers(&self) -> Self {
        let mut out = *self;
        for ability in Ability::ALL {
            out.set(ability, ability_modifier(self.get(ability)));
        }
        out
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::uniform(0)
    }
}

/// Hit points; `0 <= current <= max` after every tool application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub max: i32,
    #[serde(default)]
    pub temporary: i32,
}

impl HitPoints {
    pub fn full(max: i32) -> Self {
        Self {
            current: max,
            max,
            temporary: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDice {
    pub current: i32,
    pub max: i32,
    /// Die notation, e.g. "d10"
    #[serde(rename = "type")]
    pub die: String,
}

/// Spell slots at one level; `0 <= current <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpellSlot {
    pub current: i32,
    pub max: i32,
}

impl SpellSlot {
    pub fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }
}

/// An inventory entry; names are unique within one inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub quantity: i32,
    #[serde(default)]
    pub equipped: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub name: String,
    pub level: u8,
    pub school: String,
    pub casting_time: String,
    pub range: String,
    pub components: String,
    pub duration: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepared: Option<bool>,
}

impl Spell {
    pub const DEFAULT_SCHOOL: &'static str = "Evocation";
    pub const DEFAULT_CASTING_TIME: &'static str = "1 action";
    pub const DEFAULT_RANGE: &'static str = "60 ft";
    pub const DEFAULT_COMPONENTS: &'static str = "V, S";
    pub const DEFAULT_DURATION: &'static str = "Instantaneous";

    /// A prepared spell with the default school/timing/range details
    pub fn with_defaults(name: impl Into<String>, level: u8, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            school: Self::DEFAULT_SCHOOL.to_string(),
            casting_time: Self::DEFAULT_CASTING_TIME.to_string(),
            range: Self::DEFAULT_RANGE.to_string(),
            components: Self::DEFAULT_COMPONENTS.to_string(),
            duration: Self::DEFAULT_DURATION.to_string(),
            description: description.into(),
            prepared: Some(true),
        }
    }
}
