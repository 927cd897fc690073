//! Remote authority boundary.
//!
//! Forward commands are sent as `{ "type": ..., "entityId": ..., ... }`
//! messages, fire-and-forget. Undo is never sent as such: an undo sends the
//! forward command that restores the previous state.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vantage_math::LinearTransform;

use crate::core::{EntityId, GameObjectTransferData};

/// Wire payload of a forward command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum RemoteCommand {
    SetTransformCommand {
        entity_id: EntityId,
        transform: LinearTransform,
    },
    SetObjectNameCommand {
        entity_id: EntityId,
        name: String,
    },
    SetVariationCommand {
        entity_id: EntityId,
        variation: u32,
    },
    SpawnBlueprintCommand {
        entity_id: EntityId,
        name: String,
        parent: Option<EntityId>,
        transform: LinearTransform,
        variation: u32,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    DeleteBlueprintCommand {
        entity_id: EntityId,
    },
    EnableBlueprintCommand {
        entity_id: EntityId,
        name: String,
        parent: Option<EntityId>,
        transform: LinearTransform,
        variation: u32,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    DisableBlueprintCommand {
        entity_id: EntityId,
    },
    CreateGroupCommand {
        entity_id: EntityId,
        name: String,
        parent: Option<EntityId>,
        transform: LinearTransform,
        members: Vec<EntityId>,
    },
    DeleteGroupCommand {
        entity_id: EntityId,
    },
    SetParentCommand {
        entity_id: EntityId,
        parent: Option<EntityId>,
    },
}

impl RemoteCommand {
    pub fn spawn(data: &GameObjectTransferData) -> Self {
        RemoteCommand::SpawnBlueprintCommand {
            entity_id: data.guid,
            name: data.name.clone(),
            parent: data.parent,
            transform: data.transform,
            variation: data.variation,
            metadata: data.metadata.clone(),
        }
    }

    pub fn enable(data: &GameObjectTransferData) -> Self {
        RemoteCommand::EnableBlueprintCommand {
            entity_id: data.guid,
            name: data.name.clone(),
            parent: data.parent,
            transform: data.transform,
            variation: data.variation,
            metadata: data.metadata.clone(),
        }
    }

    /// The wire `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            RemoteCommand::SetTransformCommand { .. } => "SetTransformCommand",
            RemoteCommand::SetObjectNameCommand { .. } => "SetObjectNameCommand",
            RemoteCommand::SetVariationCommand { .. } => "SetVariationCommand",
            RemoteCommand::SpawnBlueprintCommand { .. } => "SpawnBlueprintCommand",
            RemoteCommand::DeleteBlueprintCommand { .. } => "DeleteBlueprintCommand",
            RemoteCommand::EnableBlueprintCommand { .. } => "EnableBlueprintCommand",
            RemoteCommand::DisableBlueprintCommand { .. } => "DisableBlueprintCommand",
            RemoteCommand::CreateGroupCommand { .. } => "CreateGroupCommand",
            RemoteCommand::DeleteGroupCommand { .. } => "DeleteGroupCommand",
            RemoteCommand::SetParentCommand { .. } => "SetParentCommand",
        }
    }

    pub fn entity_id(&self) -> EntityId {
        match self {
            RemoteCommand::SetTransformCommand { entity_id, .. }
            | RemoteCommand::SetObjectNameCommand { entity_id, .. }
            | RemoteCommand::SetVariationCommand { entity_id, .. }
            | RemoteCommand::SpawnBlueprintCommand { entity_id, .. }
            | RemoteCommand::DeleteBlueprintCommand { entity_id }
            | RemoteCommand::EnableBlueprintCommand { entity_id, .. }
            | RemoteCommand::DisableBlueprintCommand { entity_id }
            | RemoteCommand::CreateGroupCommand { entity_id, .. }
            | RemoteCommand::DeleteGroupCommand { entity_id }
            | RemoteCommand::SetParentCommand { entity_id, .. } => *entity_id,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Destination for forward commands. No acknowledgment is awaited.
pub trait AuthoritySink: Send + Sync {
    fn send(&self, command: RemoteCommand);
}

/// Sink for sessions without an authority.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AuthoritySink for NullSink {
    fn send(&self, command: RemoteCommand) {
        log::trace!("dropping {} for {}", command.type_name(), command.entity_id());
    }
}

/// Keeps every sent command in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<RemoteCommand>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded commands.
    pub fn take(&self) -> Vec<RemoteCommand> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn sent(&self) -> Vec<RemoteCommand> {
        self.sent.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

impl AuthoritySink for RecordingSink {
    fn send(&self, command: RemoteCommand) {
        self.sent.lock().push(command);
    }
}

/// Hands commands to a transport thread over a channel.
///
/// Delivery is at most once: if the receiver is gone the command is logged
/// and dropped.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: Sender<RemoteCommand>,
}

impl ChannelSink {
    pub fn new(tx: Sender<RemoteCommand>) -> Self {
        Self { tx }
    }

    /// Create a sink with an unbounded channel.
    pub fn unbounded() -> (Self, Receiver<RemoteCommand>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::new(tx), rx)
    }
}

impl AuthoritySink for ChannelSink {
    fn send(&self, command: RemoteCommand) {
        if let Err(err) = self.tx.send(command) {
            log::warn!("authority channel closed, dropped {}", err.0.type_name());
        }
    }
}
