//! The six ability scores

use serde::{Deserialize, Serialize};

/// One of the six D&D abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Self::Strength,
        Self::Dexterity,
        Self::Constitution,
        Self::Intelligence,
        Self::Wisdom,
        Self::Charisma,
    ];

    /// Wire names, in the order the tool contract enumerates them
    pub const NAMES: [&'static str; 6] = [
        "strength",
        "dexterity",
        "constitution",
        "intelligence",
        "wisdom",
        "charisma",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Dexterity => "dexterity",
            Self::Constitution => "constitution",
            Self::Intelligence => "intelligence",
            Self::Wisdom => "wisdom",
            Self::Charisma => "charisma",
        }
    }

    /// Three-letter label used in prompts ("STR", "DEX", ...)
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Dexterity => "DEX",
            Self::Constitution => "CON",
            Self::Intelligence => "INT",
            Self::Wisdom => "WIS",
            Self::Charisma => "CHA",
        }
    }
}

/// Ability modifier: floor((score - 10) / 2)
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_rounds_down() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(15), 2);
        assert_eq!(ability_modifier(9), -1);
    }

    #[test]
    fn test_modifier_of_extreme_scores() {
        assert_eq!(ability_modifier(i32::MIN), i32::MIN / 2);
        assert_eq!(ability_modifier(i32::MAX), (i32::MAX - 10) / 2);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(3), -4);
    }

    #[test]
    fn test_names_match_serde() {
        for (ability, name) in Ability::ALL.iter().zip(Ability::NAMES) {
            assert_eq!(ability.as_str(), name);
            assert_eq!(
                serde_json::to_value(ability).unwrap(),
                serde_json::Value::String(name.to_string())
            );
        }
    }
}
