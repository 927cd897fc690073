//! Undo/Redo history with the command pattern.
//!
//! All editor modifications go through the history system to enable
//! undo/redo. Commands are undone and redone strictly in LIFO order and
//! are never merged.

use std::collections::VecDeque;

use crate::commands::{Command, CommandContext, CommandResult, EditorCommand};
use crate::signals::{CommandFailed, HistoryAction, HistoryChanged};

/// Undo/redo history stack.
pub struct UndoHistory<C: Command = EditorCommand> {
    /// Commands that can be undone, oldest first
    undo_stack: VecDeque<C>,
    /// Commands that can be redone
    redo_stack: Vec<C>,
    /// Maximum undo depth, `None` for unbounded
    max_depth: Option<usize>,
    /// Whether history has been modified since last save
    dirty: bool,
}

impl<C: Command> Default for UndoHistory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Command> UndoHistory<C> {
    /// Default maximum history size.
    pub const DEFAULT_MAX_DEPTH: usize = 100;

    pub fn new() -> Self {
        Self::with_max_depth(Some(Self::DEFAULT_MAX_DEPTH))
    }

    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
            dirty: false,
        }
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Check if there are commands to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there are commands to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the description of the next undo command.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Get the description of the next redo command.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.description())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo stack, oldest first.
    pub fn undo_commands(&self) -> impl Iterator<Item = &C> {
        self.undo_stack.iter()
    }

    /// Redo stack, next to redo last.
    pub fn redo_commands(&self) -> impl Iterator<Item = &C> {
        self.redo_stack.iter()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark as saved (clears dirty flag).
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Run a command and record it.
    ///
    /// On success the redo stack is cleared. A failed command is not
    /// recorded; the failure is reported on `command_failed` and returned.
    pub fn execute(&mut self, mut cmd: C, cx: &mut CommandContext<'_>) -> CommandResult {
        if let Err(err) = cmd.execute(cx) {
            log::warn!("{} failed: {}", cmd.description(), err);
            cx.signals.command_failed.emit(&CommandFailed {
                description: cmd.description().to_string(),
                error: err.clone(),
            });
            return Err(err);
        }

        log::info!("Execute: {}", cmd.description());
        let description = cmd.description().to_string();
        self.undo_stack.push_back(cmd);
        self.redo_stack.clear();
        self.dirty = true;

        if let Some(max) = self.max_depth {
            while self.undo_stack.len() > max {
                self.undo_stack.pop_front();
            }
        }

        self.notify(cx, HistoryAction::Executed, description);
        Ok(())
    }

    /// Undo the most recent command.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. A command whose
    /// undo fails goes back on the undo stack.
    pub fn undo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult<bool> {
        let Some(mut cmd) = self.undo_stack.pop_back() else {
            return Ok(false);
        };

        match cmd.undo(cx) {
            Ok(()) => {
                log::info!("Undo: {}", cmd.description());
                let description = cmd.description().to_string();
                self.redo_stack.push(cmd);
                self.dirty = true;
                self.notify(cx, HistoryAction::Undone, description);
                Ok(true)
            }
            Err(err) => {
                log::warn!("Undo failed: {}", err);
                cx.signals.command_failed.emit(&CommandFailed {
                    description: cmd.description().to_string(),
                    error: err.clone(),
                });
                self.undo_stack.push_back(cmd);
                Err(err)
            }
        }
    }

    /// Redo the last undone command.
    pub fn redo(&mut self, cx: &mut CommandContext<'_>) -> CommandResult<bool> {
        let Some(mut cmd) = self.redo_stack.pop() else {
            return Ok(false);
        };

        match cmd.execute(cx) {
            Ok(()) => {
                log::info!("Redo: {}", cmd.description());
                let description = cmd.description().to_string();
                self.undo_stack.push_back(cmd);
                self.dirty = true;
                self.notify(cx, HistoryAction::Redone, description);
                Ok(true)
            }
            Err(err) => {
                log::warn!("Redo failed: {}", err);
                cx.signals.command_failed.emit(&CommandFailed {
                    description: cmd.description().to_string(),
                    error: err.clone(),
                });
                self.redo_stack.push(cmd);
                Err(err)
            }
        }
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.dirty = false;
    }

    fn notify(&self, cx: &CommandContext<'_>, action: HistoryAction, description: String) {
        cx.signals.history_changed.emit(&HistoryChanged {
            action,
            description,
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
        });
    }
}
