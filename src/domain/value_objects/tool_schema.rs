//! Tool schema registry
//!
//! The fixed, ordered catalog of operations the model may invoke. The
//! catalog is sent verbatim to every provider (as JSON Schema), and every
//! incoming invocation is checked against it before it is turned into a
//! [`GameTool`]. Names and argument shapes must stay stable: saved
//! conversations refer to them.

use std::sync::OnceLock;

use serde_json::{json, Map, Value};

use crate::domain::value_objects::{Ability, GameTool};

/// A tool invocation failed its parameter contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed arguments for tool '{tool}': {reason}")]
pub struct MalformedToolArguments {
    pub tool: String,
    pub reason: String,
}

impl MalformedToolArguments {
    fn new(tool: &str, reason: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}

/// Primitive type of one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Number { min: Option<f64>, max: Option<f64> },
    String,
    Boolean,
    Enum(&'static [&'static str]),
    Array(Box<ParamKind>),
    /// Nested object; an empty field list accepts any object
    Object(Vec<ParamSpec>),
}

impl ParamKind {
    fn number() -> Self {
        Self::Number { min: None, max: None }
    }

    fn number_between(min: f64, max: f64) -> Self {
        Self::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            Self::Number { min, max } => {
                let mut schema = json!({ "type": "number" });
                if let Some(min) = min {
                    schema["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    schema["maximum"] = json!(max);
                }
                schema
            }
            Self::String => json!({ "type": "string" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Enum(values) => json!({ "type": "string", "enum": values }),
            Self::Array(items) => json!({ "type": "array", "items": items.json_schema() }),
            Self::Object(fields) => object_schema(fields),
        }
    }

    fn check(&self, tool: &str, path: &str, value: &Value) -> Result<(), MalformedToolArguments> {
        let fail = |expected: &str| {
            Err(MalformedToolArguments::new(
                tool,
                format!("'{}' must be {}, got {}", path, expected, value),
            ))
        };

        match self {
            Self::Number { min, max } => {
                let Some(n) = value.as_f64() else {
                    return fail("a number");
                };
                if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                    return Err(MalformedToolArguments::new(
                        tool,
                        format!("'{}' is out of range: {}", path, n),
                    ));
                }
                Ok(())
            }
            Self::String if value.is_string() => Ok(()),
            Self::String => fail("a string"),
            Self::Boolean if value.is_boolean() => Ok(()),
            Self::Boolean => fail("a boolean"),
            Self::Enum(values) => match value.as_str() {
                Some(s) if values.iter().any(|v| *v == s) => Ok(()),
                _ => fail(&format!("one of [{}]", values.join(", "))),
            },
            Self::Array(items) => {
                let Some(elements) = value.as_array() else {
                    return fail("an array");
                };
                for (i, element) in elements.iter().enumerate() {
                    items.check(tool, &format!("{}[{}]", path, i), element)?;
                }
                Ok(())
            }
            Self::Object(fields) => {
                let Some(object) = value.as_object() else {
                    return fail("an object");
                };
                check_fields(tool, path, fields, object)
            }
        }
    }
}

/// One named parameter of a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: Option<&'static str>,
}

impl ParamSpec {
    fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            description: None,
        }
    }

    fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            description: None,
        }
    }

    fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = self.kind.json_schema();
        if let Some(description) = self.description {
            schema["description"] = json!(description);
        }
        schema
    }
}

/// A catalog entry: name, model-facing description, parameter contract
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    fn new(name: &'static str, description: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            name,
            description,
            params,
        }
    }

    /// JSON Schema object describing the arguments
    pub fn input_schema(&self) -> Value {
        object_schema(&self.params)
    }

    /// Check an argument payload against this entry's contract
    pub fn validate(&self, arguments: &Value) -> Result<(), MalformedToolArguments> {
        let object = arguments.as_object().ok_or_else(|| {
            MalformedToolArguments::new(self.name, "arguments must be a JSON object")
        })?;
        check_fields(self.name, "", &self.params, object)
    }
}

fn object_schema(fields: &[ParamSpec]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|field| (field.name.to_string(), field.json_schema()))
        .collect();
    let required: Vec<&str> = fields
        .iter()
        .filter(|field| field.required)
        .map(|field| field.name)
        .collect();

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn check_fields(
    tool: &str,
    prefix: &str,
    fields: &[ParamSpec],
    object: &Map<String, Value>,
) -> Result<(), MalformedToolArguments> {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{}.{}", prefix, field.name)
        };
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(MalformedToolArguments::new(
                    tool,
                    format!("missing required argument '{}'", path),
                ));
            }
            None | Some(Value::Null) => {}
            Some(value) => field.kind.check(tool, &path, value)?,
        }
    }
    Ok(())
}

/// The catalog, in the order it is sent to providers
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// The shared standard catalog
    pub fn standard() -> &'static ToolRegistry {
        static REGISTRY: OnceLock<ToolRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| ToolRegistry {
            tools: standard_catalog(),
        })
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Validate an invocation and convert it into a typed [`GameTool`]
    pub fn parse(&self, name: &str, arguments: &Value) -> Result<GameTool, MalformedToolArguments> {
        let spec = self
            .get(name)
            .ok_or_else(|| MalformedToolArguments::new(name, "unknown tool"))?;

        // end_combat takes no arguments; models sometimes send null for it
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };
        spec.validate(&arguments)?;

        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
            .map_err(|e| MalformedToolArguments::new(name, e.to_string()))
    }
}

fn standard_catalog() -> Vec<ToolSpec> {
    use ParamKind as K;
    use ParamSpec as P;

    vec![
        ToolSpec::new(
            "modify_hp",
            "Modify the character's hit points (healing or damage)",
            vec![
                P::required("amount", K::number())
                    .describe("The amount to change HP by (positive for healing, negative for damage)"),
                P::optional("temporary", K::number()).describe("Temporary HP to set (optional)"),
            ],
        ),
        ToolSpec::new(
            "modify_ability_score",
            "Set one of the character's ability scores to a new value",
            vec![
                P::required("ability", K::Enum(&Ability::NAMES)),
                P::required("value", K::number()).describe("The new value for the ability score"),
            ],
        ),
        ToolSpec::new(
            "add_inventory_item",
            "Add an item to the character's inventory (stacks with an existing item of the same name)",
            vec![
                P::required("name", K::String),
                P::required("type", K::String)
                    .describe("weapon, armor, consumable, currency, quest, etc."),
                P::required("quantity", K::number()),
                P::required("description", K::String),
                P::optional("equipped", K::Boolean),
            ],
        ),
        ToolSpec::new(
            "remove_inventory_item",
            "Remove or reduce the quantity of an item in the inventory",
            vec![
                P::required("name", K::String),
                P::required("quantity", K::number()).describe("Amount to remove"),
            ],
        ),
        ToolSpec::new(
            "modify_spell_slots",
            "Use or restore spell slots",
            vec![
                P::required("level", K::number_between(1.0, 9.0)),
                P::required("change", K::number()).describe("Positive to restore, negative to use"),
            ],
        ),
        ToolSpec::new(
            "add_experience",
            "Award experience points to the character (does not level up on its own)",
            vec![P::required("amount", K::number())],
        ),
        ToolSpec::new(
            "level_up",
            "Level up the character with new stats",
            vec![
                P::required("newMaxHP", K::number()),
                P::optional("newSpellSlots", K::Object(Vec::new()))
                    .describe("Spell slots by level, e.g. {\"2\": {\"current\": 2, \"max\": 2}}"),
                P::optional("newFeatures", K::Array(Box::new(K::String))),
            ],
        ),
        ToolSpec::new(
            "add_condition",
            "Add a condition or status effect to the character",
            vec![P::required("condition", K::String)
                .describe("e.g., poisoned, frightened, stunned, blessed")],
        ),
        ToolSpec::new(
            "remove_condition",
            "Remove a condition from the character",
            vec![P::required("condition", K::String)],
        ),
        ToolSpec::new(
            "start_combat",
            "Start a combat encounter with enemies",
            vec![P::required(
                "enemies",
                K::Array(Box::new(K::Object(vec![
                    P::required("name", K::String),
                    P::required("hp", K::number()),
                    P::required("maxHp", K::number()),
                    P::required("ac", K::number()),
                    P::optional("initiative", K::number()),
                ]))),
            )],
        ),
        ToolSpec::new("end_combat", "End the current combat encounter", Vec::new()),
        ToolSpec::new(
            "modify_enemy_hp",
            "Modify an enemy's hit points",
            vec![
                P::required("enemyName", K::String),
                P::required("amount", K::number())
                    .describe("Positive for healing, negative for damage"),
            ],
        ),
        ToolSpec::new(
            "update_location",
            "Change the character's current location",
            vec![P::required("location", K::String)],
        ),
        ToolSpec::new(
            "add_spell",
            "Add a spell to the character's spell list",
            vec![
                P::required("name", K::String),
                P::required("level", K::number_between(0.0, 9.0)),
                P::required("description", K::String),
                P::optional("school", K::String),
                P::optional("castingTime", K::String),
                P::optional("range", K::String),
                P::optional("components", K::String),
                P::optional("duration", K::String),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_names() {
        let names: Vec<&str> = ToolRegistry::standard().tools().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "modify_hp",
                "modify_ability_score",
                "add_inventory_item",
                "remove_inventory_item",
                "modify_spell_slots",
                "add_experience",
                "level_up",
                "add_condition",
                "remove_condition",
                "start_combat",
                "end_combat",
                "modify_enemy_hp",
                "update_location",
                "add_spell",
            ]
        );
    }

    #[test]
    fn test_input_schema_shape() {
        let registry = ToolRegistry::standard();

        let modify_hp = registry.get("modify_hp").unwrap().input_schema();
        assert_eq!(modify_hp["type"], "object");
        assert_eq!(modify_hp["properties"]["amount"]["type"], "number");
        assert_eq!(modify_hp["required"], json!(["amount"]));

        let ability = registry.get("modify_ability_score").unwrap().input_schema();
        assert_eq!(ability["properties"]["ability"]["enum"].as_array().unwrap().len(), 6);

        let slots = registry.get("modify_spell_slots").unwrap().input_schema();
        assert_eq!(slots["properties"]["level"]["minimum"], json!(1.0));
        assert_eq!(slots["properties"]["level"]["maximum"], json!(9.0));

        let combat = registry.get("start_combat").unwrap().input_schema();
        assert_eq!(combat["properties"]["enemies"]["items"]["properties"]["maxHp"]["type"], "number");

        let end = registry.get("end_combat").unwrap().input_schema();
        assert!(end.get("required").is_none());
    }

    #[test]
    fn test_parse_valid_invocation() {
        let tool = ToolRegistry::standard()
            .parse("modify_hp", &json!({"amount": -4}))
            .unwrap();
        assert_eq!(tool, GameTool::ModifyHp { amount: -4, temporary: None });
    }

    #[test]
    fn test_parse_level_up_with_slot_table() {
        use crate::domain::entities::SpellSlot;

        let tool = ToolRegistry::standard()
            .parse(
                "level_up",
                &json!({
                    "newMaxHP": 12,
                    "newSpellSlots": {"1": {"current": 3, "max": 3}, "2": {"current": 2, "max": 2}},
                    "newFeatures": ["Arcane Tradition"]
                }),
            )
            .unwrap();

        let slots = match tool {
            GameTool::LevelUp { new_spell_slots, .. } => new_spell_slots.unwrap(),
            other => panic!("Expected LevelUp, got {:?}", other),
        };
        assert_eq!(slots.get(&1), Some(&SpellSlot::new(3, 3)));
        assert_eq!(slots.get(&2), Some(&SpellSlot::new(2, 2)));
    }

    #[test]
    fn test_parse_clamps_huge_numbers() {
        let tool = ToolRegistry::standard()
            .parse("modify_ability_score", &json!({"ability": "strength", "value": -3000000000i64}))
            .unwrap();
        assert_eq!(
            tool,
            GameTool::ModifyAbilityScore {
                ability: Ability::Strength,
                value: i32::MIN
            }
        );
    }

    #[test]
    fn test_end_combat_accepts_null_arguments() {
        let tool = ToolRegistry::standard().parse("end_combat", &Value::Null).unwrap();
        assert_eq!(tool, GameTool::EndCombat {});
    }

    #[test]
    fn test_missing_required_argument() {
        let err = ToolRegistry::standard()
            .parse("add_inventory_item", &json!({"name": "Rope", "quantity": 1}))
            .unwrap_err();
        assert_eq!(err.tool, "add_inventory_item");
        assert!(err.reason.contains("'type'"));
    }

    #[test]
    fn test_ability_outside_enum() {
        let err = ToolRegistry::standard()
            .parse("modify_ability_score", &json!({"ability": "luck", "value": 3}))
            .unwrap_err();
        assert!(err.reason.contains("ability"));
    }

    #[test]
    fn test_wrong_primitive_type() {
        let err = ToolRegistry::standard()
            .parse("modify_hp", &json!({"amount": "lots"}))
            .unwrap_err();
        assert!(err.reason.contains("must be a number"));
    }

    #[test]
    fn test_spell_slot_level_out_of_range() {
        let err = ToolRegistry::standard()
            .parse("modify_spell_slots", &json!({"level": 10, "change": -1}))
            .unwrap_err();
        assert!(err.reason.contains("out of range"));
    }

    #[test]
    fn test_nested_enemy_contract() {
        let err = ToolRegistry::standard()
            .parse("start_combat", &json!({"enemies": [{"name": "Orc", "hp": 15, "ac": 13}]}))
            .unwrap_err();
        assert!(err.reason.contains("enemies[0].maxHp"));
    }

    #[test]
    fn test_unknown_tool() {
        let err = ToolRegistry::standard()
            .parse("summon_dragon", &json!({}))
            .unwrap_err();
        assert_eq!(err.reason, "unknown tool");
    }

    #[test]
    fn test_arguments_must_be_object() {
        let err = ToolRegistry::standard()
            .parse("update_location", &json!("Waterdeep"))
            .unwrap_err();
        assert!(err.reason.contains("JSON object"));
    }
}
