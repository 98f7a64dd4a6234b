//! Domain layer - Core game rules with no external dependencies
//!
//! This layer contains:
//! - Entities: Character, GameState, AdventureSession
//! - Value Objects: ids, abilities, the tool catalog and typed tool calls
//! - Domain Services: character derivation and dice

pub mod entities;
pub mod services;
pub mod value_objects;
