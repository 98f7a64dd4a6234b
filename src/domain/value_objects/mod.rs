//! Value objects - Immutable objects defined by their attributes

mod ability;
mod game_tools;
mod ids;
mod tool_schema;

pub use ability::{ability_modifier, Ability};
pub use game_tools::{EnemySpec, GameTool};
pub use ids::*;
pub use tool_schema::{MalformedToolArguments, ParamKind, ParamSpec, ToolRegistry, ToolSpec};
