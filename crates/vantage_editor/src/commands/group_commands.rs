//! Grouping commands.
//!
//! A group is an ordinary entity whose children are the grouped members.
//! Members keep their world pose when they move in or out of a group.

use super::{apply_parent, despawn_subtree, spawn_entities, Command, CommandContext, CommandError, CommandKind, CommandResult};
use crate::core::{EntityId, GameObjectTransferData, Placement};
use crate::integration::RemoteCommand;

fn create_group_message(group: &GameObjectTransferData, members: &[EntityId]) -> RemoteCommand {
    RemoteCommand::CreateGroupCommand {
        entity_id: group.guid,
        name: group.name.clone(),
        parent: group.parent,
        transform: group.transform,
        members: members.to_vec(),
    }
}

/// Command to put existing entities under a new group entity.
#[derive(Clone, Debug)]
pub struct CreateGroupCommand {
    pub group: GameObjectTransferData,
    pub members: Vec<EntityId>,
    // Placement of each member before grouping
    previous: Vec<Placement>,
}

impl CreateGroupCommand {
    pub fn new(group: GameObjectTransferData, members: Vec<EntityId>) -> Self {
        Self {
            group,
            members,
            previous: Vec::new(),
        }
    }

    fn validate(&self, cx: &CommandContext<'_>) -> CommandResult {
        if self.members.is_empty() {
            return Err(CommandError::InvalidOperation("group needs at least one member".to_string()));
        }
        for (i, &member) in self.members.iter().enumerate() {
            if !cx.scene.contains(member) {
                return Err(CommandError::StaleTarget(member));
            }
            if self.members[..i].contains(&member) {
                return Err(CommandError::InvalidOperation(format!("{} listed twice", member)));
            }
        }
        if let Some(parent) = self.group.parent {
            let inside_member = self
                .members
                .iter()
                .any(|&m| m == parent || cx.scene.is_ancestor(m, parent));
            if inside_member {
                return Err(CommandError::Hierarchy(format!(
                    "group parent {} lies inside one of its members",
                    parent
                )));
            }
        }
        Ok(())
    }
}

impl Command for CreateGroupCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::CreateGroup
    }

    fn description(&self) -> &str {
        "Create Group"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        self.validate(cx)?;
        spawn_entities(cx, std::slice::from_ref(&self.group))?;

        self.previous.clear();
        for &member in &self.members {
            let previous = apply_parent(cx, member, Some(self.group.guid), None)?;
            self.previous.push(previous);
        }

        log::info!("grouped {} entities under {}", self.members.len(), self.group.guid);
        cx.authority.send(create_group_message(&self.group, &self.members));
        Ok(())
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        let children = cx
            .scene
            .children(self.group.guid)
            .ok_or(CommandError::StaleTarget(self.group.guid))?;
        if children != self.members.as_slice() || self.previous.len() != self.members.len() {
            return Err(CommandError::Hierarchy(format!(
                "group {} no longer holds exactly its members",
                self.group.guid
            )));
        }

        for (&member, placement) in self.members.iter().zip(&self.previous).rev() {
            apply_parent(cx, member, placement.parent, Some(placement.index))?;
        }
        despawn_subtree(cx, self.group.guid)?;

        cx.authority.send(RemoteCommand::DeleteGroupCommand {
            entity_id: self.group.guid,
        });
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct GroupSnapshot {
    data: GameObjectTransferData,
    placement: Placement,
    members: Vec<EntityId>,
}

/// Command to dissolve a group, moving its children into the group's place.
#[derive(Clone, Debug)]
pub struct DeleteGroupCommand {
    pub group_id: EntityId,
    snapshot: Option<GroupSnapshot>,
}

impl DeleteGroupCommand {
    pub fn new(group_id: EntityId) -> Self {
        Self {
            group_id,
            snapshot: None,
        }
    }
}

impl Command for DeleteGroupCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::DeleteGroup
    }

    fn description(&self) -> &str {
        "Delete Group"
    }

    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        let group = cx
            .scene
            .get(self.group_id)
            .ok_or(CommandError::StaleTarget(self.group_id))?;
        let placement = cx
            .scene
            .placement(self.group_id)
            .ok_or(CommandError::StaleTarget(self.group_id))?;
        let snapshot = GroupSnapshot {
            data: group.to_transfer(),
            placement,
            members: group.children.clone(),
        };

        // Members take the group's slot, in order.
        for (i, &member) in snapshot.members.iter().enumerate() {
            apply_parent(cx, member, placement.parent, Some(placement.index + 1 + i))?;
        }
        despawn_subtree(cx, self.group_id)?;

        log::info!("dissolved group {}", self.group_id);
        cx.authority.send(RemoteCommand::DeleteGroupCommand {
            entity_id: self.group_id,
        });
        self.snapshot = Some(snapshot);
        Ok(())
    }

    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| CommandError::InvalidOperation("no group to restore".to_string()))?;

        let misplaced = snapshot.members.iter().find(|&&m| {
            cx.scene.get(m).map(|e| e.parent) != Some(snapshot.placement.parent)
        });
        if let Some(&member) = misplaced {
            self.snapshot = Some(snapshot);
            return Err(if cx.scene.contains(member) {
                CommandError::Hierarchy(format!("{} moved since the group was dissolved", member))
            } else {
                CommandError::StaleTarget(member)
            });
        }

        if let Err(err) = spawn_entities(cx, std::slice::from_ref(&snapshot.data)) {
            self.snapshot = Some(snapshot);
            return Err(err);
        }
        for &member in &snapshot.members {
            apply_parent(cx, member, Some(snapshot.data.guid), None)?;
        }
        apply_parent(cx, snapshot.data.guid, snapshot.placement.parent, Some(snapshot.placement.index))?;

        cx.authority.send(create_group_message(&snapshot.data, &snapshot.members));
        Ok(())
    }
}
