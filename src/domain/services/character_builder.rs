//! Level-1 character derivation
//!
//! Turns the creation inputs (name, race, class, ability scores, chosen
//! spells) into a complete sheet with derived hit points, armor class,
//! skills, saving throws, spell slots and starting gear.

use std::collections::BTreeMap;

use crate::domain::entities::{
    AbilityScores, Character, HitDice, HitPoints, InventoryItem, Spell, SpellSlot,
};
use crate::domain::value_objects::{ability_modifier, Ability, ItemId};

/// Maximum number of spells picked at creation
pub const MAX_STARTING_SPELLS: usize = 6;

/// Class facts needed for derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: &'static str,
    pub hit_die: u8,
    pub spellcaster: bool,
}

pub const CLASSES: [ClassInfo; 12] = [
    ClassInfo { name: "Barbarian", hit_die: 12, spellcaster: false },
    ClassInfo { name: "Bard", hit_die: 8, spellcaster: true },
    ClassInfo { name: "Cleric", hit_die: 8, spellcaster: true },
    ClassInfo { name: "Druid", hit_die: 8, spellcaster: true },
    ClassInfo { name: "Fighter", hit_die: 10, spellcaster: false },
    ClassInfo { name: "Monk", hit_die: 8, spellcaster: false },
    ClassInfo { name: "Paladin", hit_die: 10, spellcaster: true },
    ClassInfo { name: "Ranger", hit_die: 10, spellcaster: true },
    ClassInfo { name: "Rogue", hit_die: 8, spellcaster: false },
    ClassInfo { name: "Sorcerer", hit_die: 6, spellcaster: true },
    ClassInfo { name: "Warlock", hit_die: 8, spellcaster: true },
    ClassInfo { name: "Wizard", hit_die: 6, spellcaster: true },
];

impl ClassInfo {
    /// Case-insensitive lookup; unknown classes get a d8 and no spellcasting
    pub fn lookup(class_name: &str) -> ClassInfo {
        CLASSES
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(class_name))
            .copied()
            .unwrap_or(ClassInfo {
                name: "Adventurer",
                hit_die: 8,
                spellcaster: false,
            })
    }
}

const SKILLS: [(&str, Ability); 18] = [
    ("acrobatics", Ability::Dexterity),
    ("animalHandling", Ability::Wisdom),
    ("arcana", Ability::Intelligence),
    ("athletics", Ability::Strength),
    ("deception", Ability::Charisma),
    ("history", Ability::Intelligence),
    ("insight", Ability::Wisdom),
    ("intimidation", Ability::Charisma),
    ("investigation", Ability::Intelligence),
    ("medicine", Ability::Wisdom),
    ("nature", Ability::Intelligence),
    ("perception", Ability::Wisdom),
    ("performance", Ability::Charisma),
    ("persuasion", Ability::Charisma),
    ("religion", Ability::Intelligence),
    ("sleightOfHand", Ability::Dexterity),
    ("stealth", Ability::Dexterity),
    ("survival", Ability::Wisdom),
];

/// Inputs gathered by the character-creation collaborator
#[derive(Debug, Clone)]
pub struct NewCharacter {
    pub name: String,
    pub race: String,
    pub class_name: String,
    pub abilities: AbilityScores,
    pub spells: Vec<String>,
}

pub fn build_character(new: NewCharacter) -> Character {
    let class = ClassInfo::lookup(&new.class_name);
    let abilities = new.abilities;
    let dex_mod = ability_modifier(abilities.dexterity);
    let max_hp = (class.hit_die as i32 + ability_modifier(abilities.constitution)).max(1);

    let spell_slots: BTreeMap<u8, SpellSlot> = (1..=9)
        .map(|level| {
            let slots = if class.spellcaster && level == 1 { 2 } else { 0 };
            (level, SpellSlot::new(slots, slots))
        })
        .collect();

    let skills = SKILLS
        .iter()
        .map(|(skill, ability)| (skill.to_string(), ability_modifier(abilities.get(*ability))))
        .collect();

    let spells = new
        .spells
        .iter()
        .take(MAX_STARTING_SPELLS)
        .map(|name| Spell::with_defaults(name.clone(), 1, format!("{} spell effect", name)))
        .collect();

    Character {
        features: vec![format!("{} class features", new.class_name)],
        name: new.name,
        race: new.race,
        class_name: new.class_name,
        level: 1,
        experience: 0,
        experience_to_next_level: 300,
        abilities,
        hit_points: HitPoints::full(max_hp),
        armor_class: 10 + dex_mod,
        initiative: dex_mod,
        speed: 30,
        proficiency_bonus: 2,
        hit_dice: HitDice {
            current: 1,
            max: 1,
            die: format!("d{}", class.hit_die),
        },
        spell_slots,
        skills,
        saving_throws: abilities.modifiers(),
        inventory: starting_inventory(),
        spells,
        conditions: Vec::new(),
    }
}

fn starting_inventory() -> Vec<InventoryItem> {
    let item = |name: &str, item_type: &str, quantity: i32, equipped: bool, description: &str| {
        InventoryItem {
            id: ItemId::new(),
            name: name.to_string(),
            item_type: item_type.to_string(),
            quantity,
            equipped,
            description: description.to_string(),
        }
    };

    vec![
        item("Basic Weapon", "weapon", 1, true, "A simple weapon"),
        item("Leather Armor", "armor", 1, true, "Light armor"),
        item("Adventurer's Pack", "gear", 1, false, "Basic supplies"),
        item("Gold", "currency", 50, false, "Currency"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wizard() -> NewCharacter {
        NewCharacter {
            name: "Elara".to_string(),
            race: "Elf".to_string(),
            class_name: "Wizard".to_string(),
            abilities: AbilityScores {
                strength: 8,
                dexterity: 14,
                constitution: 13,
                intelligence: 15,
                wisdom: 12,
                charisma: 10,
            },
            spells: vec!["Magic Missile".to_string(), "Shield".to_string()],
        }
    }

    #[test]
    fn test_derived_combat_stats() {
        let character = build_character(wizard());

        assert_eq!(character.level, 1);
        assert_eq!(character.hit_points, HitPoints::full(7));
        assert_eq!(character.armor_class, 12);
        assert_eq!(character.initiative, 2);
        assert_eq!(character.hit_dice.die, "d6");
        assert_eq!(character.experience_to_next_level, 300);
    }

    #[test]
    fn test_spellcaster_slots() {
        let character = build_character(wizard());
        assert_eq!(character.spell_slots.len(), 9);
        assert_eq!(character.spell_slots[&1], SpellSlot::new(2, 2));
        assert_eq!(character.spell_slots[&9], SpellSlot::new(0, 0));

        let mut fighter = wizard();
        fighter.class_name = "fighter".to_string();
        let fighter = build_character(fighter);
        assert_eq!(fighter.spell_slots[&1], SpellSlot::new(0, 0));
        assert_eq!(fighter.hit_dice.die, "d10");
    }

    #[test]
    fn test_skills_and_saves_follow_modifiers() {
        let character = build_character(wizard());
        assert_eq!(character.skills.len(), 18);
        assert_eq!(character.skills["arcana"], 2);
        assert_eq!(character.skills["athletics"], -1);
        assert_eq!(character.saving_throws.intelligence, 2);
        assert_eq!(character.saving_throws.charisma, 0);
    }

    #[test]
    fn test_starting_gear_and_spells() {
        let mut input = wizard();
        input.spells = (0..8).map(|i| format!("Spell {}", i)).collect();
        let character = build_character(input);

        assert_eq!(character.inventory.len(), 4);
        assert_eq!(character.find_item("Gold").map(|i| i.quantity), Some(50));
        assert_eq!(character.spells.len(), MAX_STARTING_SPELLS);
        assert_eq!(character.spells[0].prepared, Some(true));
        assert_eq!(character.features, vec!["Wizard class features".to_string()]);
    }

    #[test]
    fn test_minimum_one_hit_point() {
        let mut input = wizard();
        input.abilities.constitution = 1;
        assert_eq!(build_character(input).hit_points.max, 1);
    }
}
