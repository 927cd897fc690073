//! Command pattern implementation for undo/redo support.
//!
//! All editor modifications that should be undoable must go through
//! the command system. The set of commands is closed: `EditorCommand`
//! dispatches to one struct per kind.

mod command;
mod transform_commands;
mod property_commands;
mod entity_commands;
mod group_commands;

pub use command::{Command, CommandContext, CommandError, CommandKind, CommandResult};
pub use transform_commands::{ReparentCommand, SetTransformCommand};
pub use property_commands::{SetObjectNameCommand, SetVariationCommand};
pub use entity_commands::{
    DeleteBlueprintCommand,
    DisableBlueprintCommand,
    EnableBlueprintCommand,
    SpawnBlueprintCommand,
};
pub use group_commands::{CreateGroupCommand, DeleteGroupCommand};

use vantage_math::LinearTransform;

use crate::core::{EntityId, GameObjectTransferData, RemovedSubtree, SceneEntity};
use crate::integration::{project_entity, remove_nodes, reparent_node, update_transform};
use crate::signals::{ObjectAdded, ObjectChange, ObjectChanged, ObjectRemoved};

/// Any command the editor can record in its history.
pub enum EditorCommand {
    SetTransform(SetTransformCommand),
    SetObjectName(SetObjectNameCommand),
    SetVariation(SetVariationCommand),
    SpawnBlueprint(SpawnBlueprintCommand),
    DeleteBlueprint(DeleteBlueprintCommand),
    EnableBlueprint(EnableBlueprintCommand),
    DisableBlueprint(DisableBlueprintCommand),
    CreateGroup(CreateGroupCommand),
    DeleteGroup(DeleteGroupCommand),
    Reparent(ReparentCommand),
}

impl EditorCommand {
    fn inner(&self) -> &dyn Command {
        match self {
            EditorCommand::SetTransform(c) => c,
            EditorCommand::SetObjectName(c) => c,
            EditorCommand::SetVariation(c) => c,
            EditorCommand::SpawnBlueprint(c) => c,
            EditorCommand::DeleteBlueprint(c) => c,
            EditorCommand::EnableBlueprint(c) => c,
            EditorCommand::DisableBlueprint(c) => c,
            EditorCommand::CreateGroup(c) => c,
            EditorCommand::DeleteGroup(c) => c,
            EditorCommand::Reparent(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Command {
        match self {
            EditorCommand::SetTransform(c) => c,
            EditorCommand::SetObjectName(c) => c,
            EditorCommand::SetVariation(c) => c,
            EditorCommand::SpawnBlueprint(c) => c,
            EditorCommand::DeleteBlueprint(c) => c,
            EditorCommand::EnableBlueprint(c) => c,
            EditorCommand::DisableBlueprint(c) => c,
            EditorCommand::CreateGroup(c) => c,
            EditorCommand::DeleteGroup(c) => c,
            EditorCommand::Reparent(c) => c,
        }
    }
}

impl Command for EditorCommand {
    fn kind(&self) -> CommandKind {
        self.inner().kind()
    }

    fn description(&self) -> &str {
        self.inner().description()
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.inner_mut().execute(cx)
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.inner_mut().undo(cx)
    }
}

impl std::fmt::Debug for EditorCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind(), self.description())
    }
}

macro_rules! impl_from_command {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for EditorCommand {
                fn from(cmd: $ty) -> Self {
                    EditorCommand::$variant(cmd)
                }
            }
        )*
    };
}

impl_from_command! {
    SetTransform => SetTransformCommand,
    SetObjectName => SetObjectNameCommand,
    SetVariation => SetVariationCommand,
    SpawnBlueprint => SpawnBlueprintCommand,
    DeleteBlueprint => DeleteBlueprintCommand,
    EnableBlueprint => EnableBlueprintCommand,
    DisableBlueprint => DisableBlueprintCommand,
    CreateGroup => CreateGroupCommand,
    DeleteGroup => DeleteGroupCommand,
    Reparent => ReparentCommand,
}

// ============================================================================
// Shared scene operations
// ============================================================================

/// Set an entity's transform in the model and the renderer.
pub(crate) fn apply_transform(
    cx: &mut CommandContext<'_>,
    id: EntityId,
    transform: LinearTransform,
) -> CommandResult {
    if !cx.scene.contains(id) {
        return Err(CommandError::StaleTarget(id));
    }
    if let Err(err) = transform.validate() {
        log::error!("refusing transform for {}: {}", id, err);
        return Err(CommandError::InvalidTransform(id, err));
    }

    update_transform(cx.renderer, id, &transform)
        .map_err(|err| CommandError::InvalidTransform(id, err))?;
    if let Some(entity) = cx.scene.get_mut(id) {
        entity.transform = transform;
    }

    cx.signals.object_changed.emit(&ObjectChanged {
        entity_id: id,
        change: ObjectChange::Transform(transform),
    });
    resync_descendants(cx, id);
    Ok(())
}

/// Copy the new world transforms of `id`'s descendants into the model.
///
/// The renderer carries children along when their parent moves.
fn resync_descendants(cx: &mut CommandContext<'_>, id: EntityId) {
    for child in cx.scene.subtree(id).into_iter().skip(1) {
        let Some(world) = cx.renderer.compose_world_matrix(child) else {
            log::warn!("no renderer node for {}", child);
            continue;
        };
        let transform = match LinearTransform::from_matrix(&world) {
            Ok(transform) => transform,
            Err(err) => {
                log::warn!("cannot resync {}: {}", child, err);
                continue;
            }
        };
        if let Some(entity) = cx.scene.get_mut(child) {
            entity.transform = transform;
        }
        cx.signals.object_changed.emit(&ObjectChanged {
            entity_id: child,
            change: ObjectChange::Transform(transform),
        });
    }
}

/// Move an entity in the model and the renderer, keeping its world pose.
///
/// Returns the previous placement.
pub(crate) fn apply_parent(
    cx: &mut CommandContext<'_>,
    id: EntityId,
    parent: Option<EntityId>,
    index: Option<usize>,
) -> CommandResult<crate::core::Placement> {
    let previous = cx.scene.set_parent(id, parent, index)?;
    reparent_node(cx.renderer, id, parent);
    cx.signals.object_changed.emit(&ObjectChanged {
        entity_id: id,
        change: ObjectChange::Parent(parent),
    });
    Ok(previous)
}

/// Insert entities (parent-first) into the model and project them.
///
/// Everything is checked before the first insert.
pub(crate) fn spawn_entities(
    cx: &mut CommandContext<'_>,
    objects: &[GameObjectTransferData],
) -> CommandResult {
    for (i, data) in objects.iter().enumerate() {
        if cx.scene.contains(data.guid) || objects[..i].iter().any(|o| o.guid == data.guid) {
            return Err(CommandError::DuplicateId(data.guid));
        }
        if let Some(parent) = data.parent {
            let earlier = objects[..i].iter().any(|o| o.guid == parent);
            if !earlier && !cx.scene.contains(parent) {
                return Err(CommandError::StaleTarget(parent));
            }
        }
        data.transform
            .validate()
            .map_err(|err| CommandError::InvalidTransform(data.guid, err))?;
    }

    for data in objects {
        let entity = SceneEntity::from_transfer(data);
        cx.scene.insert(entity.clone())?;
        project_entity(cx.renderer, &entity)
            .map_err(|err| CommandError::InvalidTransform(entity.id, err))?;
        cx.signals.object_added.emit(&ObjectAdded {
            entity_id: entity.id,
            parent: entity.parent,
        });
    }
    Ok(())
}

/// Remove an entity and its descendants from the model and the renderer.
pub(crate) fn despawn_subtree(cx: &mut CommandContext<'_>, id: EntityId) -> CommandResult<RemovedSubtree> {
    let removed = cx.scene.remove_subtree(id)?;
    let ids: Vec<EntityId> = removed.ids().collect();
    remove_nodes(cx.renderer, &ids);
    for &entity_id in ids.iter().rev() {
        cx.signals.object_removed.emit(&ObjectRemoved { entity_id });
    }
    Ok(removed)
}

/// Put a removed subtree back into the model and the renderer.
pub(crate) fn restore_subtree(cx: &mut CommandContext<'_>, removed: &RemovedSubtree) -> CommandResult {
    cx.scene.restore_subtree(removed)?;
    for entity in &removed.entities {
        project_entity(cx.renderer, entity)
            .map_err(|err| CommandError::InvalidTransform(entity.id, err))?;
        cx.signals.object_added.emit(&ObjectAdded {
            entity_id: entity.id,
            parent: entity.parent,
        });
    }
    Ok(())
}
