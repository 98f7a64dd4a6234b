//! Tool Execution Service - Applies model-issued tool calls to game state
//!
//! Every mutation of the character sheet or game state after creation goes
//! through here. Each tool keeps the sheet's invariants intact: hit points
//! and spell slots stay within `0..=max`, inventory names stay unique,
//! conditions stay a set, and an encounter with no enemies left is over.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::entities::{Character, Enemy, GameState, InventoryItem, Spell, SpellSlot};
use crate::domain::value_objects::{Ability, EnemyId, EnemySpec, GameTool, ItemId};

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecutionResult {
    /// Wire name of the tool
    pub tool: String,
    /// False when the tool matched nothing (unknown item, enemy or slot level)
    pub applied: bool,
    /// Human-readable description of what happened
    pub description: String,
    /// List of state changes that occurred
    pub state_changes: Vec<StateChange>,
}

/// Individual state changes caused by tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum StateChange {
    HitPointsChanged {
        from: i32,
        to: i32,
        max: i32,
        temporary: i32,
    },
    AbilityScoreChanged {
        ability: Ability,
        from: i32,
        to: i32,
    },
    ItemAdded {
        item: String,
        quantity: i32,
    },
    ItemQuantityChanged {
        item: String,
        from: i32,
        to: i32,
    },
    ItemRemoved {
        item: String,
    },
    SpellSlotsChanged {
        level: u8,
        from: i32,
        to: i32,
    },
    ExperienceGained {
        amount: i32,
        total: i64,
    },
    LeveledUp {
        level: u32,
        max_hp: i32,
    },
    ConditionAdded {
        condition: String,
    },
    ConditionRemoved {
        condition: String,
    },
    CombatStarted {
        enemies: Vec<String>,
    },
    CombatEnded,
    EnemyHpChanged {
        enemy: String,
        from: i32,
        to: i32,
    },
    EnemyDefeated {
        enemy: String,
    },
    LocationChanged {
        location: String,
    },
    SpellLearned {
        spell: String,
    },
}

/// Service for applying game tools to a character and game state
pub struct ToolExecutionService;

impl ToolExecutionService {
    /// Create a new tool execution service
    pub fn new() -> Self {
        Self
    }

    /// Apply one tool call in place
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let service = ToolExecutionService::new();
    /// let tool = GameTool::ModifyHp { amount: -4, temporary: None };
    ///
    /// let result = service.execute_tool(&tool, &mut character, &mut game_state);
    /// assert!(result.applied);
    /// ```
    #[instrument(skip(self, character, game_state), fields(tool = tool.name()))]
    pub fn execute_tool(
        &self,
        tool: &GameTool,
        character: &mut Character,
        game_state: &mut GameState,
    ) -> ToolExecutionResult {
        let (applied, state_changes) = match tool {
            GameTool::ModifyHp { amount, temporary } => {
                self.execute_modify_hp(*amount, *temporary, character)
            }
            GameTool::ModifyAbilityScore { ability, value } => {
                let from = character.abilities.get(*ability);
                character.abilities.set(*ability, *value);
                (
                    true,
                    vec![StateChange::AbilityScoreChanged {
                        ability: *ability,
                        from,
                        to: *value,
                    }],
                )
            }
            GameTool::AddInventoryItem {
                name,
                item_type,
                quantity,
                description,
                equipped,
            } => self.execute_add_item(
                name,
                item_type,
                *quantity,
                description,
                equipped.unwrap_or(false),
                character,
            ),
            GameTool::RemoveInventoryItem { name, quantity } => {
                self.execute_remove_item(name, *quantity, character)
            }
            GameTool::ModifySpellSlots { level, change } => {
                self.execute_modify_spell_slots(*level, *change, character)
            }
            GameTool::AddExperience { amount } => {
                character.experience = character.experience.saturating_add(*amount as i64).max(0);
                (
                    true,
                    vec![StateChange::ExperienceGained {
                        amount: *amount,
                        total: character.experience,
                    }],
                )
            }
            GameTool::LevelUp {
                new_max_hp,
                new_spell_slots,
                new_features,
            } => {
                character.level = character.level.saturating_add(1);
                character.experience = 0;
                character.experience_to_next_level = character.level as i64 * 300;

                let max_hp = (*new_max_hp).max(0);
                character.hit_points.max = max_hp;
                character.hit_points.current = max_hp;

                if let Some(slots) = new_spell_slots {
                    for (level, slot) in slots.iter().filter(|(level, _)| (1..=9).contains(*level)) {
                        let max = slot.max.max(0);
                        character
                            .spell_slots
                            .insert(*level, SpellSlot::new(slot.current.clamp(0, max), max));
                    }
                }
                if let Some(features) = new_features {
                    character.features.extend(features.iter().cloned());
                }

                (
                    true,
                    vec![StateChange::LeveledUp {
                        level: character.level,
                        max_hp,
                    }],
                )
            }
            GameTool::AddCondition { condition } => {
                if character.has_condition(condition) {
                    (false, vec![])
                } else {
                    character.conditions.push(condition.clone());
                    (
                        true,
                        vec![StateChange::ConditionAdded {
                            condition: condition.clone(),
                        }],
                    )
                }
            }
            GameTool::RemoveCondition { condition } => {
                let before = character.conditions.len();
                character.conditions.retain(|c| c != condition);
                if character.conditions.len() == before {
                    (false, vec![])
                } else {
                    (
                        true,
                        vec![StateChange::ConditionRemoved {
                            condition: condition.clone(),
                        }],
                    )
                }
            }
            GameTool::StartCombat { enemies } => self.execute_start_combat(enemies, game_state),
            GameTool::EndCombat {} => {
                game_state.in_combat = false;
                game_state.enemies.clear();
                game_state.current_turn = None;
                (true, vec![StateChange::CombatEnded])
            }
            GameTool::ModifyEnemyHp { enemy_name, amount } => {
                self.execute_modify_enemy_hp(enemy_name, *amount, game_state)
            }
            GameTool::UpdateLocation { location } => {
                game_state.location = location.clone();
                (
                    true,
                    vec![StateChange::LocationChanged {
                        location: location.clone(),
                    }],
                )
            }
            GameTool::AddSpell {
                name,
                level,
                description,
                school,
                casting_time,
                range,
                components,
                duration,
            } => {
                let or_default =
                    |value: &Option<String>, default: &str| value.clone().unwrap_or_else(|| default.to_string());
                character.spells.push(Spell {
                    name: name.clone(),
                    level: (*level).clamp(0, 9) as u8,
                    school: or_default(school, Spell::DEFAULT_SCHOOL),
                    casting_time: or_default(casting_time, Spell::DEFAULT_CASTING_TIME),
                    range: or_default(range, Spell::DEFAULT_RANGE),
                    components: or_default(components, Spell::DEFAULT_COMPONENTS),
                    duration: or_default(duration, Spell::DEFAULT_DURATION),
                    description: description.clone(),
                    prepared: Some(true),
                });
                (true, vec![StateChange::SpellLearned { spell: name.clone() }])
            }
        };

        if applied {
            info!("Applied {}: {}", tool.name(), tool.description());
        } else {
            debug!("Tool {} had no effect", tool.name());
        }

        ToolExecutionResult {
            tool: tool.name().to_string(),
            applied,
            description: tool.description(),
            state_changes,
        }
    }

    /// Apply a sequence of tool calls in order
    pub fn execute_all(
        &self,
        tools: &[GameTool],
        character: &mut Character,
        game_state: &mut GameState,
    ) -> Vec<ToolExecutionResult> {
        tools
            .iter()
            .map(|tool| self.execute_tool(tool, character, game_state))
            .collect()
    }

    fn execute_modify_hp(
        &self,
        amount: i32,
        temporary: Option<i32>,
        character: &mut Character,
    ) -> (bool, Vec<StateChange>) {
        let hp = &mut character.hit_points;
        let from = hp.current;
        hp.current = clamp(hp.current as i64 + amount as i64, 0, hp.max as i64);
        if let Some(temporary) = temporary {
            hp.temporary = temporary.max(0);
        }

        (
            true,
            vec![StateChange::HitPointsChanged {
                from,
                to: hp.current,
                max: hp.max,
                temporary: hp.temporary,
            }],
        )
    }

    fn execute_add_item(
        &self,
        name: &str,
        item_type: &str,
        quantity: i32,
        description: &str,
        equipped: bool,
        character: &mut Character,
    ) -> (bool, Vec<StateChange>) {
        let inventory = &mut character.inventory;

        if let Some(index) = inventory.iter().position(|item| item.name == name) {
            let from = inventory[index].quantity;
            let to = from.saturating_add(quantity);
            if to <= 0 {
                inventory.remove(index);
                return (true, vec![StateChange::ItemRemoved { item: name.to_string() }]);
            }
            inventory[index].quantity = to;
            return (
                true,
                vec![StateChange::ItemQuantityChanged {
                    item: name.to_string(),
                    from,
                    to,
                }],
            );
        }

        if quantity <= 0 {
            return (false, vec![]);
        }

        inventory.push(InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            item_type: item_type.to_string(),
            quantity,
            equipped,
            description: description.to_string(),
        });
        (
            true,
            vec![StateChange::ItemAdded {
                item: name.to_string(),
                quantity,
            }],
        )
    }

    fn execute_remove_item(
        &self,
        name: &str,
        quantity: i32,
        character: &mut Character,
    ) -> (bool, Vec<StateChange>) {
        let inventory = &mut character.inventory;
        let Some(index) = inventory.iter().position(|item| item.name == name) else {
            return (false, vec![]);
        };

        let from = inventory[index].quantity;
        let to = from.saturating_sub(quantity);
        if to <= 0 {
            inventory.remove(index);
            (true, vec![StateChange::ItemRemoved { item: name.to_string() }])
        } else {
            inventory[index].quantity = to;
            (
                true,
                vec![StateChange::ItemQuantityChanged {
                    item: name.to_string(),
                    from,
                    to,
                }],
            )
        }
    }

    fn execute_modify_spell_slots(
        &self,
        level: i32,
        change: i32,
        character: &mut Character,
    ) -> (bool, Vec<StateChange>) {
        let Ok(level) = u8::try_from(level) else {
            return (false, vec![]);
        };
        let Some(slot) = character.spell_slots.get_mut(&level) else {
            return (false, vec![]);
        };

        let from = slot.current;
        slot.current = clamp(slot.current as i64 + change as i64, 0, slot.max as i64);
        (
            true,
            vec![StateChange::SpellSlotsChanged {
                level,
                from,
                to: slot.current,
            }],
        )
    }

    fn execute_start_combat(
        &self,
        enemies: &[EnemySpec],
        game_state: &mut GameState,
    ) -> (bool, Vec<StateChange>) {
        // Zero-HP enemies are kept; the next modify_enemy_hp sweeps them
        game_state.in_combat = true;
        game_state.enemies = enemies
            .iter()
            .map(|spec| Enemy {
                id: EnemyId::new(),
                name: spec.name.clone(),
                hp: spec.hp,
                max_hp: spec.max_hp,
                ac: spec.ac,
                initiative: spec.initiative.unwrap_or(0),
            })
            .collect();

        (
            true,
            vec![StateChange::CombatStarted {
                enemies: enemies.iter().map(|e| e.name.clone()).collect(),
            }],
        )
    }

    fn execute_modify_enemy_hp(
        &self,
        enemy_name: &str,
        amount: i32,
        game_state: &mut GameState,
    ) -> (bool, Vec<StateChange>) {
        let Some(enemy) = game_state.enemies.iter_mut().find(|e| e.name == enemy_name) else {
            return (false, vec![]);
        };

        let from = enemy.hp;
        enemy.hp = clamp(enemy.hp as i64 + amount as i64, 0, enemy.max_hp as i64);
        let mut changes = vec![StateChange::EnemyHpChanged {
            enemy: enemy_name.to_string(),
            from,
            to: enemy.hp,
        }];

        game_state.enemies.retain(|enemy| {
            if enemy.is_defeated() {
                changes.push(StateChange::EnemyDefeated {
                    enemy: enemy.name.clone(),
                });
                false
            } else {
                true
            }
        });

        if game_state.enemies.is_empty() {
            game_state.in_combat = false;
            game_state.current_turn = None;
            changes.push(StateChange::CombatEnded);
        }

        (true, changes)
    }
}

impl Default for ToolExecutionService {
    fn default() -> Self {
        Self::new()
    }
}

/// `max(lo, min(hi, x))`; never panics even when `hi < lo`
fn clamp(x: i64, lo: i64, hi: i64) -> i32 {
    lo.max(hi.min(x)) as i32
}
