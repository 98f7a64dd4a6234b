//! Identifiers for inventory entries and combatants
//!
//! Saves written by older clients carry arbitrary string ids (timestamps,
//! `enemy_<ts>_<n>`), so ids are string-backed. Fresh ids are UUID v4.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

define_id!(ItemId);
define_id!(EnemyId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        assert_ne!(ItemId::new(), ItemId::new());
        assert_ne!(EnemyId::new(), EnemyId::new());
    }

    #[test]
    fn test_legacy_ids_round_trip_as_plain_strings() {
        let id: ItemId = serde_json::from_str("\"1700000000000\"").unwrap();
        assert_eq!(id.as_str(), "1700000000000");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1700000000000\"");
    }
}
