//! Game tools that can be called by the LLM
//!
//! Each variant is one state mutation the model may request. Variant and
//! argument names are the wire names sent to the provider in the tool
//! catalog, so a tool call deserializes straight into this enum once its
//! arguments have passed the registry's parameter contract.

use std::collections::BTreeMap;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::domain::entities::SpellSlot;
use crate::domain::value_objects::Ability;

/// A validated, typed tool invocation
///
/// # Examples
///
/// ```ignore
/// let tool: GameTool = serde_json::from_value(json!({
///     "name": "modify_hp",
///     "arguments": { "amount": -4 }
/// }))?;
/// assert_eq!(tool.name(), "modify_hp");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum GameTool {
    /// Heal (positive) or damage (negative); optionally set temporary HP
    ModifyHp {
        #[serde(deserialize_with = "number::int")]
        amount: i32,
        #[serde(default, deserialize_with = "number::opt_int")]
        temporary: Option<i32>,
    },

    ModifyAbilityScore {
        ability: Ability,
        #[serde(deserialize_with = "number::int")]
        value: i32,
    },

    /// Stack onto an existing item of the same name, or add a new entry
    AddInventoryItem {
        name: String,
        #[serde(rename = "type")]
        item_type: String,
        #[serde(deserialize_with = "number::int")]
        quantity: i32,
        description: String,
        #[serde(default)]
        equipped: Option<bool>,
    },

    RemoveInventoryItem {
        name: String,
        #[serde(deserialize_with = "number::int")]
        quantity: i32,
    },

    /// Spend (negative) or restore (positive) slots at one level
    ModifySpellSlots {
        #[serde(deserialize_with = "number::int")]
        level: i32,
        #[serde(deserialize_with = "number::int")]
        change: i32,
    },

    AddExperience {
        #[serde(deserialize_with = "number::int")]
        amount: i32,
    },

    LevelUp {
        #[serde(rename = "newMaxHP", deserialize_with = "number::int")]
        new_max_hp: i32,
        #[serde(rename = "newSpellSlots", default, deserialize_with = "slot_table")]
        new_spell_slots: Option<BTreeMap<u8, SpellSlot>>,
        #[serde(rename = "newFeatures", default)]
        new_features: Option<Vec<String>>,
    },

    AddCondition {
        condition: String,
    },

    RemoveCondition {
        condition: String,
    },

    StartCombat {
        enemies: Vec<EnemySpec>,
    },

    EndCombat {},

    ModifyEnemyHp {
        #[serde(rename = "enemyName")]
        enemy_name: String,
        #[serde(deserialize_with = "number::int")]
        amount: i32,
    },

    UpdateLocation {
        location: String,
    },

    AddSpell {
        name: String,
        #[serde(deserialize_with = "number::int")]
        level: i32,
        description: String,
        #[serde(default)]
        school: Option<String>,
        #[serde(rename = "castingTime", default)]
        casting_time: Option<String>,
        #[serde(default)]
        range: Option<String>,
        #[serde(default)]
        components: Option<String>,
        #[serde(default)]
        duration: Option<String>,
    },
}

impl GameTool {
    /// Get the tool name for this variant
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModifyHp { .. } => "modify_hp",
            Self::ModifyAbilityScore { .. } => "modify_ability_score",
            Self::AddInventoryItem { .. } => "add_inventory_item",
            Self::RemoveInventoryItem { .. } => "remove_inventory_item",
            Self::ModifySpellSlots { .. } => "modify_spell_slots",
            Self::AddExperience { .. } => "add_experience",
            Self::LevelUp { .. } => "level_up",
            Self::AddCondition { .. } => "add_condition",
            Self::RemoveCondition { .. } => "remove_condition",
            Self::StartCombat { .. } => "start_combat",
            Self::EndCombat {} => "end_combat",
            Self::ModifyEnemyHp { .. } => "modify_enemy_hp",
            Self::UpdateLocation { .. } => "update_location",
            Self::AddSpell { .. } => "add_spell",
        }
    }

    /// Get a human-readable description of what this tool will do
    pub fn description(&self) -> String {
        match self {
            Self::ModifyHp { amount, .. } if *amount < 0 => {
                format!("Take {} damage", amount.unsigned_abs())
            }
            Self::ModifyHp { amount, .. } => format!("Heal {} hit points", amount),
            Self::ModifyAbilityScore { ability, value } => {
                format!("Set {} to {}", ability.as_str(), value)
            }
            Self::AddInventoryItem { name, quantity, .. } => format!("Gain {} x{}", name, quantity),
            Self::RemoveInventoryItem { name, quantity } => format!("Lose {} x{}", name, quantity),
            Self::ModifySpellSlots { level, change } => {
                format!("Adjust level {} spell slots by {}", level, change)
            }
            Self::AddExperience { amount } => format!("Gain {} XP", amount),
            Self::LevelUp { new_max_hp, .. } => format!("Level up (max HP {})", new_max_hp),
            Self::AddCondition { condition } => format!("Become {}", condition),
            Self::RemoveCondition { condition } => format!("No longer {}", condition),
            Self::StartCombat { enemies } => format!("Start combat against {} enemies", enemies.len()),
            Self::EndCombat {} => "End combat".to_string(),
            Self::ModifyEnemyHp { enemy_name, amount } => {
                format!("Change {} HP by {}", enemy_name, amount)
            }
            Self::UpdateLocation { location } => format!("Travel to {}", location),
            Self::AddSpell { name, .. } => format!("Learn {}", name),
        }
    }
}

/// An enemy as described by `start_combat`, before it is given an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemySpec {
    pub name: String,
    #[serde(deserialize_with = "number::int")]
    pub hp: i32,
    #[serde(deserialize_with = "number::int")]
    pub max_hp: i32,
    #[serde(deserialize_with = "number::int")]
    pub ac: i32,
    #[serde(default, deserialize_with = "number::opt_int")]
    pub initiative: Option<i32>,
}

/// JSON object keys are strings, so slot levels arrive as `"1"`, `"2"`, ...
fn slot_table<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BTreeMap<u8, SpellSlot>>, D::Error> {
    let Some(raw) = Option::<BTreeMap<String, SpellSlot>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    raw.into_iter()
        .map(|(level, slot)| {
            level
                .trim()
                .parse::<u8>()
                .map(|level| (level, slot))
                .map_err(|_| D::Error::custom(format!("invalid spell slot level '{}'", level)))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Some)
}

/// Models emit JSON numbers as `5` or `5.0` interchangeably; both are
/// accepted and truncated toward zero.
mod number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        Int(i64),
        Float(f64),
    }

    impl Num {
        fn to_i32(&self) -> i32 {
            match *self {
                Num::Int(v) => v.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
                Num::Float(v) => v as i32,
            }
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        Num::deserialize(deserializer).map(|n| n.to_i32())
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        Option::<Num>::deserialize(deserializer).map(|n| n.map(|n| n.to_i32()))
    }
}
