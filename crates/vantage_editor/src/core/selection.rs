//! Selection management with multi-select support.
//!
//! Every operation reports what it changed as a `SelectionChange`, so the
//! session can update entity flags and publish selection signals without
//! diffing.

use super::EntityId;

/// How a selection request combines with the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Plain click
    #[default]
    Replace,
    /// Extend the selection
    Add,
    Remove,
    /// Flip membership
    Toggle,
}

/// Entities that entered and left the selection in one operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub added: Vec<EntityId>,
    pub removed: Vec<EntityId>,
}

impl SelectionChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered set of selected entities. The most recently selected one is
/// the primary.
#[derive(Clone, Debug, Default)]
pub struct SelectionManager {
    selected: Vec<EntityId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<EntityId> {
        self.selected.last().copied()
    }

    /// Selected entities, oldest first.
    pub fn selected(&self) -> &[EntityId] {
        &self.selected
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    pub fn select(&mut self, id: EntityId, mode: SelectionMode) -> SelectionChange {
        match mode {
            SelectionMode::Replace => self.select_multiple([id]),
            SelectionMode::Add => self.push(id),
            SelectionMode::Remove => self.remove(id),
            SelectionMode::Toggle if self.is_selected(id) => self.remove(id),
            SelectionMode::Toggle => self.push(id),
        }
    }

    /// Replace the whole selection.
    pub fn select_multiple(&mut self, ids: impl IntoIterator<Item = EntityId>) -> SelectionChange {
        let mut next: Vec<EntityId> = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }

        let change = SelectionChange {
            added: next.iter().copied().filter(|id| !self.is_selected(*id)).collect(),
            removed: self.selected.iter().copied().filter(|id| !next.contains(id)).collect(),
        };
        self.selected = next;
        change
    }

    pub fn clear(&mut self) -> SelectionChange {
        SelectionChange {
            added: Vec::new(),
            removed: std::mem::take(&mut self.selected),
        }
    }

    /// Drop every entity for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) -> SelectionChange {
        let (kept, removed): (Vec<EntityId>, Vec<EntityId>) =
            self.selected.iter().copied().partition(|&id| keep(id));
        self.selected = kept;
        SelectionChange {
            added: Vec::new(),
            removed,
        }
    }

    /// Select `id` and make it primary.
    fn push(&mut self, id: EntityId) -> SelectionChange {
        let was_selected = self.is_selected(id);
        self.selected.retain(|&e| e != id);
        self.selected.push(id);
        SelectionChange {
            added: if was_selected { Vec::new() } else { vec![id] },
            removed: Vec::new(),
        }
    }

    fn remove(&mut self, id: EntityId) -> SelectionChange {
        let before = self.selected.len();
        self.selected.retain(|&e| e != id);
        SelectionChange {
            added: Vec::new(),
            removed: if self.selected.len() < before { vec![id] } else { Vec::new() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> EntityId {
        EntityId::from_u128(n)
    }

    #[test]
    fn test_replace_reports_swap() {
        let mut sel = SelectionManager::new();
        sel.select(id(1), SelectionMode::Replace);
        let change = sel.select(id(2), SelectionMode::Replace);

        assert_eq!(change.added, vec![id(2)]);
        assert_eq!(change.removed, vec![id(1)]);
        assert_eq!(sel.selected(), &[id(2)]);
    }

    #[test]
    fn test_add_moves_primary() {
        let mut sel = SelectionManager::new();
        sel.select_multiple([id(1), id(2)]);
        assert_eq!(sel.primary(), Some(id(2)));

        let change = sel.select(id(1), SelectionMode::Add);
        assert!(change.is_empty());
        assert_eq!(sel.primary(), Some(id(1)));
        assert_eq!(sel.count(), 2);
    }

    #[test]
    fn test_toggle() {
        let mut sel = SelectionManager::new();
        sel.select(id(1), SelectionMode::Toggle);
        assert!(sel.is_selected(id(1)));

        let change = sel.select(id(1), SelectionMode::Toggle);
        assert_eq!(change.removed, vec![id(1)]);
        assert!(sel.is_empty());
        assert_eq!(sel.primary(), None);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut sel = SelectionManager::new();
        sel.select(id(1), SelectionMode::Replace);
        assert!(sel.select(id(9), SelectionMode::Remove).is_empty());
    }

    #[test]
    fn test_retain_reports_removed() {
        let mut sel = SelectionManager::new();
        sel.select_multiple([id(1), id(2), id(3)]);
        let change = sel.retain(|e| e != id(2));

        assert_eq!(change.removed, vec![id(2)]);
        assert_eq!(sel.selected(), &[id(1), id(3)]);
        assert_eq!(sel.primary(), Some(id(3)));
    }
}
