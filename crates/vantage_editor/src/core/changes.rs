//! Change detection between the model and the renderer.
//!
//! An entity has moved when the matrix of its committed transform differs
//! from its renderer world matrix by more than an absolute per-element
//! tolerance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vantage_math::{LinearTransform, Mat4, TransformError};

use super::{EntityId, SceneEntity};

/// Tracked fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeField {
    Transform,
}

/// Freshly captured world transform of a moved entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveObjectMessage {
    pub entity_id: EntityId,
    pub transform: LinearTransform,
}

/// A non-empty set of field changes.
///
/// "No change" is `None` at the call site, never an empty `Changes`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Changes(BTreeMap<ChangeField, MoveObjectMessage>);

impl Changes {
    fn from_map(map: BTreeMap<ChangeField, MoveObjectMessage>) -> Option<Self> {
        if map.is_empty() {
            None
        } else {
            Some(Self(map))
        }
    }

    pub fn transform(&self) -> Option<&MoveObjectMessage> {
        self.0.get(&ChangeField::Transform)
    }

    pub fn fields(&self) -> impl Iterator<Item = ChangeField> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> BTreeMap<ChangeField, MoveObjectMessage> {
        self.0
    }
}

/// Whether the renderer world matrix differs from the committed transform.
pub fn has_moved(entity: &SceneEntity, world: &Mat4, epsilon: f32) -> bool {
    !entity.transform.to_matrix().abs_diff_eq(world, epsilon)
}

/// Compare an entity with its renderer world matrix.
pub fn detect_changes(
    entity: &SceneEntity,
    world: &Mat4,
    epsilon: f32,
) -> Result<Option<Changes>, TransformError> {
    let mut changes = BTreeMap::new();

    if has_moved(entity, world, epsilon) {
        changes.insert(
            ChangeField::Transform,
            MoveObjectMessage {
                entity_id: entity.id,
                transform: LinearTransform::from_matrix(world)?,
            },
        );
    }

    Ok(Changes::from_map(changes))
}
