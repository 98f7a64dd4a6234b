//! Domain services - Pure rules with no I/O

mod character_builder;
mod dice;

pub use character_builder::{build_character, ClassInfo, NewCharacter, CLASSES, MAX_STARTING_SPELLS};
pub use dice::{quick_roll, roll_die, QuickRoll, RollResult};
