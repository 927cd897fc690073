//! Transform and hierarchy commands (move, reparent).

use vantage_math::LinearTransform;

use super::{apply_parent, apply_transform, Command, CommandContext, CommandError, CommandKind, CommandResult};
use crate::core::{EntityId, Placement};
use crate::integration::RemoteCommand;

/// Command to set an entity's transform directly.
///
/// Both transforms are captured up front; undo re-applies the old one as
/// is, so repeated undo/redo never drifts.
#[derive(Clone, Debug)]
pub struct SetTransformCommand {
    pub entity_id: EntityId,
    pub new_transform: LinearTransform,
    pub old_transform: LinearTransform,
}

impl SetTransformCommand {
    pub fn new(entity_id: EntityId, new_transform: LinearTransform, old_transform: LinearTransform) -> Self {
        Self {
            entity_id,
            new_transform,
            old_transform,
        }
    }

    fn apply(&self, cx: &mut CommandContext<'_>, transform: LinearTransform) -> CommandResult {
        apply_transform(cx, self.entity_id, transform)?;
        cx.authority.send(RemoteCommand::SetTransformCommand {
            entity_id: self.entity_id,
            transform,
        });
        Ok(())
    }
}

impl Command for SetTransformCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::SetTransform
    }

    fn description(&self) -> &str {
        "Set Transform"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.apply(cx, self.new_transform)
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.apply(cx, self.old_transform)
    }
}

/// Command to change an entity's parent in the hierarchy.
///
/// The entity keeps its world pose; only its parent-relative matrix in the
/// renderer changes.
#[derive(Clone, Debug)]
pub struct ReparentCommand {
    pub entity_id: EntityId,
    pub new_parent: Option<EntityId>,
    old_placement: Option<Placement>,
}

impl ReparentCommand {
    pub fn new(entity_id: EntityId, new_parent: Option<EntityId>) -> Self {
        Self {
            entity_id,
            new_parent,
            old_placement: None,
        }
    }
}

impl Command for ReparentCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::Reparent
    }

    fn description(&self) -> &str {
        "Reparent"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        let previous = apply_parent(cx, self.entity_id, self.new_parent, None)?;
        self.old_placement = Some(previous);

        log::info!("reparented {} under {:?}", self.entity_id, self.new_parent);
        cx.authority.send(RemoteCommand::SetParentCommand {
            entity_id: self.entity_id,
            parent: self.new_parent,
        });
        Ok(())
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        let old = self
            .old_placement
            .ok_or_else(|| CommandError::InvalidOperation("reparent was never executed".to_string()))?;
        apply_parent(cx, self.entity_id, old.parent, Some(old.index))?;

        cx.authority.send(RemoteCommand::SetParentCommand {
            entity_id: self.entity_id,
            parent: old.parent,
        });
        Ok(())
    }
}
