//! Scene model: entities, hierarchy links and transfer data.
//!
//! The model's parent/child links are the single source of truth for the
//! hierarchy. The renderer graph is a projection kept in sync by
//! `integration::renderer`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vantage_math::LinearTransform;

use super::EntityId;
use crate::commands::{CommandError, CommandResult};

/// A scene entity with all its properties.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneEntity {
    /// Unique identifier
    pub id: EntityId,
    /// Display name
    pub name: String,
    /// Last applied transform, in world space
    pub transform: LinearTransform,
    /// Parent entity, `None` for scene roots
    pub parent: Option<EntityId>,
    /// Children in sibling order
    pub children: Vec<EntityId>,
    /// Blueprint variation key
    pub variation: u32,
    /// User-defined data carried along with the entity
    pub metadata: Map<String, Value>,
    /// Presentation only, never persisted
    pub selected: bool,
    /// Presentation only, never persisted
    pub visible: bool,
}

impl SceneEntity {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            transform: LinearTransform::IDENTITY,
            parent: None,
            children: Vec::new(),
            variation: 0,
            metadata: Map::new(),
            selected: false,
            visible: false,
        }
    }

    pub fn with_transform(mut self, transform: LinearTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_parent(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_variation(mut self, variation: u32) -> Self {
        self.variation = variation;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn from_transfer(data: &GameObjectTransferData) -> Self {
        Self {
            id: data.guid,
            name: data.name.clone(),
            transform: data.transform,
            parent: data.parent,
            children: Vec::new(),
            variation: data.variation,
            metadata: data.metadata.clone(),
            selected: false,
            visible: false,
        }
    }

    pub fn to_transfer(&self) -> GameObjectTransferData {
        GameObjectTransferData {
            guid: self.id,
            name: self.name.clone(),
            transform: self.transform,
            parent: self.parent,
            variation: self.variation,
            metadata: self.metadata.clone(),
        }
    }
}

/// Everything needed to (re)create one entity, locally or on the authority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObjectTransferData {
    pub guid: EntityId,
    pub name: String,
    pub transform: LinearTransform,
    #[serde(default)]
    pub parent: Option<EntityId>,
    #[serde(default)]
    pub variation: u32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl GameObjectTransferData {
    pub fn new(guid: EntityId, name: impl Into<String>, transform: LinearTransform) -> Self {
        Self {
            guid,
            name: name.into(),
            transform,
            parent: None,
            variation: 0,
            metadata: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: Option<EntityId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_variation(mut self, variation: u32) -> Self {
        self.variation = variation;
        self
    }
}

/// Where an entity sits in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub parent: Option<EntityId>,
    /// Index in the parent's child list (or the root list)
    pub index: usize,
}

/// A detached subtree, parent-first, ready to be put back.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedSubtree {
    pub placement: Placement,
    pub entities: Vec<SceneEntity>,
}

impl RemovedSubtree {
    pub fn root(&self) -> Option<&SceneEntity> {
        self.entities.first()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|e| e.id)
    }
}

/// Entity store with consistent parent/child links.
///
/// Every entity appears in exactly one child list (or the root list) and
/// the hierarchy has no cycles.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    entities: HashMap<EntityId, SceneEntity>,
    roots: Vec<EntityId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&SceneEntity> {
        self.entities.get(&id)
    }

    /// Mutable access for non-structural fields.
    ///
    /// Use `set_parent` to change hierarchy links.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SceneEntity> {
        self.entities.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneEntity> {
        self.entities.values()
    }

    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    pub fn children(&self, id: EntityId) -> Option<&[EntityId]> {
        self.entities.get(&id).map(|e| e.children.as_slice())
    }

    /// Insert a new entity under its `parent` (appended as last child).
    ///
    /// The entity's own child list is ignored; children link themselves
    /// when they are inserted.
    pub fn insert(&mut self, mut entity: SceneEntity) -> CommandResult {
        if self.contains(entity.id) {
            return Err(CommandError::DuplicateId(entity.id));
        }
        if let Some(parent) = entity.parent {
            if !self.contains(parent) {
                return Err(CommandError::StaleTarget(parent));
            }
        }

        entity.children.clear();
        let (id, parent) = (entity.id, entity.parent);
        self.entities.insert(id, entity);
        self.link(id, parent, None);
        Ok(())
    }

    pub fn placement(&self, id: EntityId) -> Option<Placement> {
        let parent = self.entities.get(&id)?.parent;
        let index = self.siblings(parent)?.iter().position(|&s| s == id)?;
        Some(Placement { parent, index })
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: EntityId, id: EntityId) -> bool {
        let mut current = self.get(id).and_then(|e| e.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(|e| e.parent);
        }
        false
    }

    /// Move `id` under `new_parent` at `index` (appended when `None`).
    ///
    /// Returns the previous placement so the move can be reversed.
    pub fn set_parent(
        &mut self,
        id: EntityId,
        new_parent: Option<EntityId>,
        index: Option<usize>,
    ) -> CommandResult<Placement> {
        let previous = self.placement(id).ok_or(CommandError::StaleTarget(id))?;
        if let Some(parent) = new_parent {
            if !self.contains(parent) {
                return Err(CommandError::StaleTarget(parent));
            }
            if parent == id || self.is_ancestor(id, parent) {
                return Err(CommandError::Hierarchy(format!(
                    "{} cannot be parented under itself or its descendant {}",
                    id, parent
                )));
            }
        }

        self.unlink(id, previous.parent);
        self.link(id, new_parent, index);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.parent = new_parent;
        }
        Ok(previous)
    }

    /// Ids of `id` and all its descendants, parent-first. Empty if missing.
    pub fn subtree(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(entity) = self.entities.get(&next) {
                out.push(next);
                stack.extend(entity.children.iter().rev());
            }
        }
        out
    }

    /// All entity ids, roots in order, each followed by its subtree.
    pub fn ids_in_order(&self) -> Vec<EntityId> {
        self.roots.iter().flat_map(|&root| self.subtree(root)).collect()
    }

    /// Detach `id` and its descendants from the scene.
    pub fn remove_subtree(&mut self, id: EntityId) -> CommandResult<RemovedSubtree> {
        let placement = self.placement(id).ok_or(CommandError::StaleTarget(id))?;
        let ids = self.subtree(id);

        self.unlink(id, placement.parent);
        let entities = ids
            .iter()
            .filter_map(|i| self.entities.remove(i))
            .collect();

        Ok(RemovedSubtree { placement, entities })
    }

    /// Put a removed subtree back where it was.
    pub fn restore_subtree(&mut self, removed: &RemovedSubtree) -> CommandResult {
        let root = removed
            .root()
            .ok_or_else(|| CommandError::InvalidOperation("empty subtree".to_string()))?;
        if let Some(taken) = removed.entities.iter().find(|e| self.contains(e.id)) {
            return Err(CommandError::DuplicateId(taken.id));
        }
        if let Some(parent) = removed.placement.parent {
            if !self.contains(parent) {
                return Err(CommandError::StaleTarget(parent));
            }
        }

        let root_id = root.id;
        for entity in &removed.entities {
            let restored = SceneEntity {
                selected: false,
                visible: false,
                ..entity.clone()
            };
            self.entities.insert(entity.id, restored);
        }
        self.link(root_id, removed.placement.parent, Some(removed.placement.index));
        Ok(())
    }

    /// Deep copy of a subtree with fresh ids, parent-first.
    ///
    /// The copy of `id` keeps the same parent; copied descendants point at
    /// the copied ids. Nothing is inserted.
    pub fn clone_subtree(&self, id: EntityId) -> CommandResult<Vec<SceneEntity>> {
        let ids = self.subtree(id);
        if ids.is_empty() {
            return Err(CommandError::StaleTarget(id));
        }

        let fresh: HashMap<EntityId, EntityId> =
            ids.iter().map(|&old| (old, EntityId::new())).collect();
        let remap = |old: EntityId| fresh.get(&old).copied().unwrap_or(old);

        Ok(ids
            .iter()
            .filter_map(|&old| self.get(old))
            .map(|source| SceneEntity {
                id: remap(source.id),
                parent: source.parent.map(remap),
                children: source.children.iter().map(|&c| remap(c)).collect(),
                selected: false,
                ..source.clone()
            })
            .collect())
    }

    /// Transfer data for `id` and its descendants, parent-first.
    pub fn transfer_subtree(&self, id: EntityId) -> Vec<GameObjectTransferData> {
        self.subtree(id)
            .into_iter()
            .filter_map(|i| self.get(i))
            .map(SceneEntity::to_transfer)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.roots.clear();
    }

    fn siblings(&self, parent: Option<EntityId>) -> Option<&Vec<EntityId>> {
        match parent {
            None => Some(&self.roots),
            Some(p) => self.entities.get(&p).map(|e| &e.children),
        }
    }

    fn siblings_mut(&mut self, parent: Option<EntityId>) -> Option<&mut Vec<EntityId>> {
        match parent {
            None => Some(&mut self.roots),
            Some(p) => self.entities.get_mut(&p).map(|e| &mut e.children),
        }
    }

    fn link(&mut self, id: EntityId, parent: Option<EntityId>, index: Option<usize>) {
        if let Some(siblings) = self.siblings_mut(parent) {
            match index {
                Some(i) if i < siblings.len() => siblings.insert(i, id),
                _ => siblings.push(id),
            }
        }
    }

    fn unlink(&mut self, id: EntityId, parent: Option<EntityId>) {
        if let Some(siblings) = self.siblings_mut(parent) {
            siblings.retain(|&s| s != id);
        }
    }
}
