//! Prompt building functions for LLM requests

use crate::domain::entities::{AdventurePreferences, Character, GameState};
use crate::domain::value_objects::Ability;

/// Fixed dungeon-master persona sent as the head of every system prompt
pub const DM_INSTRUCTIONS: &str = "You are an expert Dungeon Master for D&D 5th Edition. \
You have complete control over the game world and the player's character stats.

You can modify ANY aspect of the character by using the provided functions. This includes:
- HP, ability scores, AC, and all stats
- Inventory (add/remove items, change quantities, equip/unequip)
- Spell slots (use/restore)
- Experience and leveling up
- Conditions and status effects
- Spell lists and features

ADVENTURE CUSTOMIZATION:
- Pay close attention to the Adventure Description in the Adventure Preferences
- Narrative, tone, encounters and setting must match what the player requested
- Weave the character's backstory into the adventure naturally

RULES:
1. Narrate vividly, matching the tone of the requested adventure
2. Ask for rolls when appropriate (perception, stealth, attack, etc.)
3. Update character stats through the functions whenever something happens
4. Award XP for encounters and creative solutions; level up explicitly
5. Add loot to the inventory after victories or discoveries
6. Spend spell slots when the player casts spells
7. Apply conditions (poisoned, frightened, etc.) when relevant
8. Start and end combat through the functions and track enemy HP
9. Create interesting NPCs and dialogue
10. Make the world feel alive and responsive";

const DEFAULT_ADVENTURE: &str = "Classic D&D adventure";
const DEFAULT_BACKSTORY: &str = "No backstory provided";

/// Build the adventure-preferences block
pub fn build_adventure_context(preferences: &AdventurePreferences) -> String {
    let mut context = String::from("Adventure Preferences:\n");
    context.push_str(&format!(
        "- Adventure Description: {}\n",
        non_blank(&preferences.adventure_description).unwrap_or(DEFAULT_ADVENTURE)
    ));
    context.push_str(&format!(
        "- Character Backstory: {}\n",
        non_blank(&preferences.backstory).unwrap_or(DEFAULT_BACKSTORY)
    ));
    context.push_str(
        "\nUse this information to create a personalized adventure. Reference the backstory \
         when appropriate and build scenarios that fit the requested style.",
    );
    context
}

/// Build the current-state block the model reads before deciding on tools
pub fn build_character_context(character: &Character, game_state: &GameState) -> String {
    let abilities = &character.abilities;
    let inventory = character
        .inventory
        .iter()
        .map(|item| format!("{} ({})", item.name, item.quantity))
        .collect::<Vec<_>>()
        .join(", ");
    let conditions = if character.conditions.is_empty() {
        "None".to_string()
    } else {
        character.conditions.join(", ")
    };

    let mut context = String::from("Current Character State:\n");
    context.push_str(&format!(
        "- HP: {}/{}\n",
        character.hit_points.current, character.hit_points.max
    ));
    context.push_str(&format!(
        "- Level: {}, XP: {}/{}\n",
        character.level, character.experience, character.experience_to_next_level
    ));
    let stats = Ability::ALL
        .iter()
        .map(|ability| format!("{} {}", ability.abbreviation(), abilities.get(*ability)))
        .collect::<Vec<_>>()
        .join(", ");
    context.push_str(&format!("- Stats: {}\n", stats));
    context.push_str(&format!("- AC: {}\n", character.armor_class));
    context.push_str(&format!("- Inventory: {}\n", inventory));
    context.push_str(&format!("- Conditions: {}\n", conditions));
    context.push_str(&format!("- In Combat: {}\n", game_state.in_combat));
    context.push_str(&format!("- Location: {}\n", game_state.location));

    if !game_state.enemies.is_empty() {
        let enemies = game_state
            .enemies
            .iter()
            .map(|enemy| format!("{} (HP: {}/{})", enemy.name, enemy.hp, enemy.max_hp))
            .collect::<Vec<_>>()
            .join(", ");
        context.push_str(&format!("- Enemies: {}\n", enemies));
    }

    context
}

/// Instructions, adventure context and current state, joined by blank lines
pub fn build_system_prompt(
    preferences: &AdventurePreferences,
    character: &Character,
    game_state: &GameState,
) -> String {
    [
        DM_INSTRUCTIONS.to_string(),
        build_adventure_context(preferences),
        build_character_context(character, game_state),
    ]
    .join("\n\n")
}

/// The synthetic first player message of a fresh adventure
pub fn build_opening_prompt(character: &Character, preferences: &AdventurePreferences) -> String {
    let adventure = non_blank(&preferences.adventure_description).unwrap_or("a classic D&D adventure");
    let backstory = non_blank(&preferences.backstory).unwrap_or("no backstory");

    format!(
        "I want to start my adventure!\n\n\
         My Character: {name}, a level {level} {race} {class}\n\
         Character Backstory: {backstory}\n\
         Requested Adventure Type: {adventure}\n\n\
         Create an opening narrative that directly relates to the adventure type I requested \
         (\"{adventure}\") and incorporates my character's backstory. Set the scene vividly, \
         establish the tone, introduce the initial situation or conflict, and end with what I \
         see, hear and feel and what I should do next.",
        name = character.name,
        level = character.level,
        race = character.race,
        class = character.class_name,
        backstory = backstory,
        adventure = adventure,
    )
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
