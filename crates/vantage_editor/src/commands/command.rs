//! Command trait and result types.

use thiserror::Error;
use vantage_math::TransformError;

use crate::core::{EntityId, Scene};
use crate::integration::{AuthoritySink, RendererAdapter};
use crate::signals::NotificationBus;

/// Result type for command execution.
pub type CommandResult<T = ()> = Result<T, CommandError>;

/// Errors that can occur during command execution.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CommandError {
    /// The command targets an entity that no longer exists
    #[error("Stale target: entity {0} no longer exists")]
    StaleTarget(EntityId),

    /// An entity with this id already exists
    #[error("Duplicate entity id: {0}")]
    DuplicateId(EntityId),

    /// The transform cannot be applied to the renderer
    #[error("Invalid transform for entity {0}: {1}")]
    InvalidTransform(EntityId, TransformError),

    /// The hierarchy change would break parent/child consistency
    #[error("Hierarchy error: {0}")]
    Hierarchy(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Type tag of a command, also used as the wire `type` of its forward message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SetTransform,
    SetObjectName,
    SetVariation,
    SpawnBlueprint,
    DeleteBlueprint,
    EnableBlueprint,
    DisableBlueprint,
    CreateGroup,
    DeleteGroup,
    Reparent,
}

impl CommandKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            CommandKind::SetTransform => "SetTransformCommand",
            CommandKind::SetObjectName => "SetObjectNameCommand",
            CommandKind::SetVariation => "SetVariationCommand",
            CommandKind::SpawnBlueprint => "SpawnBlueprintCommand",
            CommandKind::DeleteBlueprint => "DeleteBlueprintCommand",
            CommandKind::EnableBlueprint => "EnableBlueprintCommand",
            CommandKind::DisableBlueprint => "DisableBlueprintCommand",
            CommandKind::CreateGroup => "CreateGroupCommand",
            CommandKind::DeleteGroup => "DeleteGroupCommand",
            CommandKind::Reparent => "SetParentCommand",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Everything a command may touch while it runs.
pub struct CommandContext<'a> {
    pub scene: &'a mut Scene,
    pub renderer: &'a mut dyn RendererAdapter,
    pub authority: &'a dyn AuthoritySink,
    pub signals: &'a NotificationBus,
}

/// A command that can be executed, undone, and redone.
///
/// Commands are the primary way to modify editor state. Each one is
/// constructed with the data needed for both directions and refers to
/// entities by id only. `undo` re-applies captured state rather than
/// deriving it again.
///
/// A command must check its targets before mutating anything, so a
/// failed `execute` or `undo` leaves the scene as it found it.
pub trait Command {
    fn kind(&self) -> CommandKind;

    /// Human-readable description for the undo/redo menu.
    fn description(&self) -> &str;

    /// Execute the command, modifying the editor state.
    fn execute(&mut self, cx: &mut CommandContext<'_>) -> CommandResult;

    /// Undo the command, restoring the previous state.
    fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult;
}
