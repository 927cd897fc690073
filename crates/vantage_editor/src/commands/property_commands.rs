//! Name and variation commands.

use super::{Command, CommandContext, CommandError, CommandKind, CommandResult};
use crate::core::EntityId;
use crate::integration::RemoteCommand;
use crate::signals::{ObjectChange, ObjectChanged};

/// Command to rename an entity.
#[derive(Clone, Debug)]
pub struct SetObjectNameCommand {
    pub entity_id: EntityId,
    pub new_name: String,
    pub old_name: String,
}

impl SetObjectNameCommand {
    pub fn new(entity_id: EntityId, new_name: impl Into<String>, old_name: impl Into<String>) -> Self {
        Self {
            entity_id,
            new_name: new_name.into(),
            old_name: old_name.into(),
        }
    }

    fn apply(&self, cx: &mut CommandContext<'_>, name: &str) -> CommandResult {
        let entity = cx
            .scene
            .get_mut(self.entity_id)
            .ok_or(CommandError::StaleTarget(self.entity_id))?;
        entity.name = name.to_string();

        cx.signals.object_changed.emit(&ObjectChanged {
            entity_id: self.entity_id,
            change: ObjectChange::Name(name.to_string()),
        });
        cx.authority.send(RemoteCommand::SetObjectNameCommand {
            entity_id: self.entity_id,
            name: name.to_string(),
        });
        Ok(())
    }
}

impl Command for SetObjectNameCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::SetObjectName
    }

    fn description(&self) -> &str {
        "Rename"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.apply(cx, &self.new_name)
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.apply(cx, &self.old_name)
    }
}

/// Command to switch an entity's blueprint variation.
#[derive(Clone, Debug)]
pub struct SetVariationCommand {
    pub entity_id: EntityId,
    pub new_variation: u32,
    pub old_variation: u32,
}

impl SetVariationCommand {
    pub fn new(entity_id: EntityId, new_variation: u32, old_variation: u32) -> Self {
        Self {
            entity_id,
            new_variation,
            old_variation,
        }
    }

    fn apply(&self, cx: &mut CommandContext<'_>, variation: u32) -> CommandResult {
        let entity = cx
            .scene
            .get_mut(self.entity_id)
            .ok_or(CommandError::StaleTarget(self.entity_id))?;
        entity.variation = variation;

        cx.signals.object_changed.emit(&ObjectChanged {
            entity_id: self.entity_id,
            change: ObjectChange::Variation(variation),
        });
        cx.authority.send(RemoteCommand::SetVariationCommand {
            entity_id: self.entity_id,
            variation,
        });
        Ok(())
    }
}

impl Command for SetVariationCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::SetVariation
    }

    fn description(&self) -> &str {
        "Set Variation"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.apply(cx, self.new_variation)
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.apply(cx, self.old_variation)
    }
}
