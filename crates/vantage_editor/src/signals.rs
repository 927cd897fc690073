//! Notification bus shared by an editor session.
//!
//! One typed `Signal` per channel. The bus is constructed by the host and
//! passed to the session explicitly; `teardown` disconnects everything when
//! the session ends.

use vantage_event::Signal;
use vantage_math::LinearTransform;

use crate::commands::CommandError;
use crate::core::EntityId;

/// Field-level change carried by `object_changed`.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectChange {
    Transform(LinearTransform),
    Name(String),
    Variation(u32),
    Parent(Option<EntityId>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectChanged {
    pub entity_id: EntityId,
    pub change: ObjectChange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectAdded {
    pub entity_id: EntityId,
    pub parent: Option<EntityId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectRemoved {
    pub entity_id: EntityId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryAction {
    Executed,
    Undone,
    Redone,
    Cleared,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryChanged {
    pub action: HistoryAction,
    /// Description of the command involved, empty for `Cleared`
    pub description: String,
    pub undo_count: usize,
    pub redo_count: usize,
}

/// A command that failed to execute, undo or redo.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandFailed {
    pub description: String,
    pub error: CommandError,
}

/// All channels of an editor session.
#[derive(Debug)]
pub struct NotificationBus {
    pub object_changed: Signal<ObjectChanged>,
    pub object_added: Signal<ObjectAdded>,
    pub object_removed: Signal<ObjectRemoved>,
    pub object_selected: Signal<EntityId>,
    pub object_deselected: Signal<EntityId>,
    pub history_changed: Signal<HistoryChanged>,
    pub command_failed: Signal<CommandFailed>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            object_changed: Signal::new("object_changed"),
            object_added: Signal::new("object_added"),
            object_removed: Signal::new("object_removed"),
            object_selected: Signal::new("object_selected"),
            object_deselected: Signal::new("object_deselected"),
            history_changed: Signal::new("history_changed"),
            command_failed: Signal::new("command_failed"),
        }
    }

    /// Disconnect every subscriber on every channel.
    pub fn teardown(&self) {
        self.object_changed.disconnect_all();
        self.object_added.disconnect_all();
        self.object_removed.disconnect_all();
        self.object_selected.disconnect_all();
        self.object_deselected.disconnect_all();
        self.history_changed.disconnect_all();
        self.command_failed.disconnect_all();
        log::debug!("notification bus torn down");
    }

    pub fn subscriber_count(&self) -> usize {
        self.object_changed.subscriber_count()
            + self.object_added.subscriber_count()
            + self.object_removed.subscriber_count()
            + self.object_selected.subscriber_count()
            + self.object_deselected.subscriber_count()
            + self.history_changed.subscriber_count()
            + self.command_failed.subscriber_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_teardown_disconnects_all_channels() {
        let bus = NotificationBus::new();
        let calls = Arc::new(AtomicU32::new(0));

        let c = calls.clone();
        bus.object_selected.connect(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = calls.clone();
        bus.history_changed.connect(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.subscriber_count(), 2);

        bus.teardown();
        assert_eq!(bus.subscriber_count(), 0);
        bus.object_selected.emit(&EntityId::from_u128(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
