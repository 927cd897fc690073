//! Core editor types and state management.
//!
//! This module contains the scene model, the undo history and the
//! supporting types every command operates on.

mod scene;
mod history;
mod selection;
mod changes;
mod config;

pub use scene::{GameObjectTransferData, Placement, RemovedSubtree, Scene, SceneEntity};
pub use history::UndoHistory;
pub use selection::{SelectionChange, SelectionManager, SelectionMode};
pub use changes::{detect_changes, has_moved, ChangeField, Changes, MoveObjectMessage};
pub use config::{ChangeConfig, ConfigError, EditorConfig, HistoryConfig};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entity identifier used throughout the editor.
///
/// Ids are generated locally for new objects or assigned by the authority
/// for remote spawns. An id is never reused for a different entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generate a fresh random id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_parse_round_trip() {
        let id = EntityId::from_u128(0x42);
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::from_u128(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(EntityId::new(), EntityId::new());
    }
}
