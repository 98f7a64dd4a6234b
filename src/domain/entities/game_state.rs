//! Encounter and world position state

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EnemyId;

/// Game state alongside the character sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub in_combat: bool,
    #[serde(default)]
    pub current_turn: Option<String>,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub location: String,
}

impl GameState {
    pub fn find_enemy(&self, name: &str) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.name == name)
    }
}

/// A combatant in the current encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub id: EnemyId,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub ac: i32,
    #[serde(default)]
    pub initiative: i32,
}

impl Enemy {
    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_client_game_state() {
        let json = r#"{
            "inCombat": true,
            "currentTurn": null,
            "enemies": [{"id": "enemy_1_0", "name": "Goblin", "hp": 7, "maxHp": 7, "ac": 15}],
            "narrative": "",
            "location": "Cragmaw Hideout"
        }"#;

        let state: GameState = serde_json::from_str(json).unwrap();
        assert!(state.in_combat);
        assert_eq!(state.current_turn, None);
        let goblin = state.find_enemy("Goblin").unwrap();
        assert_eq!(goblin.max_hp, 7);
        assert_eq!(goblin.initiative, 0);
        assert!(!goblin.is_defeated());
    }

    #[test]
    fn test_default_is_out_of_combat() {
        let state = GameState::default();
        assert!(!state.in_combat);
        assert!(state.enemies.is_empty());
        assert!(state.location.is_empty());
    }
}
