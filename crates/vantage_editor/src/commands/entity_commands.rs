//! Blueprint spawn, delete, enable and disable commands.

use super::{despawn_subtree, restore_subtree, spawn_entities, Command, CommandContext, CommandError, CommandKind, CommandResult};
use crate::core::{EntityId, GameObjectTransferData, RemovedSubtree};
use crate::integration::RemoteCommand;

/// Command to spawn one or more objects.
///
/// Objects are listed parent-first; a parent may be an earlier object of
/// the same batch or an existing entity.
#[derive(Clone, Debug)]
pub struct SpawnBlueprintCommand {
    pub objects: Vec<GameObjectTransferData>,
}

impl SpawnBlueprintCommand {
    pub fn new(objects: Vec<GameObjectTransferData>) -> Self {
        Self { objects }
    }

    pub fn single(object: GameObjectTransferData) -> Self {
        Self::new(vec![object])
    }

    /// Objects whose parent is not part of the batch.
    fn batch_roots(&self) -> Vec<EntityId> {
        self.objects
            .iter()
            .filter(|o| match o.parent {
                Some(parent) => !self.objects.iter().any(|other| other.guid == parent),
                None => true,
            })
            .map(|o| o.guid)
            .collect()
    }
}

impl Command for SpawnBlueprintCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::SpawnBlueprint
    }

    fn description(&self) -> &str {
        "Spawn Blueprint"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        if self.objects.is_empty() {
            return Err(CommandError::InvalidOperation("nothing to spawn".to_string()));
        }
        spawn_entities(cx, &self.objects)?;

        log::info!("spawned {} object(s)", self.objects.len());
        for data in &self.objects {
            cx.authority.send(RemoteCommand::spawn(data));
        }
        Ok(())
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        if let Some(missing) = self.objects.iter().find(|o| !cx.scene.contains(o.guid)) {
            return Err(CommandError::StaleTarget(missing.guid));
        }

        for root in self.batch_roots().into_iter().rev() {
            despawn_subtree(cx, root)?;
            cx.authority.send(RemoteCommand::DeleteBlueprintCommand { entity_id: root });
        }
        Ok(())
    }
}

/// Command to delete an entity and everything under it.
#[derive(Clone, Debug)]
pub struct DeleteBlueprintCommand {
    pub entity_id: EntityId,
    // Stored for undo
    removed: Option<RemovedSubtree>,
}

impl DeleteBlueprintCommand {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            removed: None,
        }
    }
}

impl Command for DeleteBlueprintCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::DeleteBlueprint
    }

    fn description(&self) -> &str {
        "Delete Blueprint"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        let removed = despawn_subtree(cx, self.entity_id)?;
        log::info!("deleted {} ({} entities)", self.entity_id, removed.entities.len());
        self.removed = Some(removed);

        cx.authority.send(RemoteCommand::DeleteBlueprintCommand {
            entity_id: self.entity_id,
        });
        Ok(())
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        let removed = self
            .removed
            .as_ref()
            .ok_or_else(|| CommandError::InvalidOperation("no entity to restore".to_string()))?;
        restore_subtree(cx, removed)?;

        for entity in &removed.entities {
            cx.authority.send(RemoteCommand::spawn(&entity.to_transfer()));
        }
        self.removed = None;
        Ok(())
    }
}

/// Command asking the authority to disable a live object.
///
/// Only the id is sent; the local entity goes away when the authority
/// reports the removal. Undo re-enables it from the captured transfer data.
#[derive(Clone, Debug)]
pub struct DisableBlueprintCommand {
    pub data: GameObjectTransferData,
}

impl DisableBlueprintCommand {
    pub fn new(data: GameObjectTransferData) -> Self {
        Self { data }
    }
}

impl Command for DisableBlueprintCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::DisableBlueprint
    }

    fn description(&self) -> &str {
        "Disable Blueprint"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        if !cx.scene.contains(self.data.guid) {
            return Err(CommandError::StaleTarget(self.data.guid));
        }
        cx.authority.send(RemoteCommand::DisableBlueprintCommand {
            entity_id: self.data.guid,
        });
        Ok(())
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        cx.authority.send(RemoteCommand::enable(&self.data));
        Ok(())
    }
}

/// Command asking the authority to re-enable a disabled object.
#[derive(Clone, Debug)]
pub struct EnableBlueprintCommand {
    pub data: GameObjectTransferData,
}

impl EnableBlueprintCommand {
    pub fn new(data: GameObjectTransferData) -> Self {
        Self { data }
    }
}

impl Command for EnableBlueprintCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::EnableBlueprint
    }

    fn description(&self) -> &str {
        "Enable Blueprint"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        cx.authority.send(RemoteCommand::enable(&self.data));
        Ok(())
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        cx.authority.send(RemoteCommand::DisableBlueprintCommand {
            entity_id: self.data.guid,
        });
        Ok(())
    }
}
