//! Editor session - single owner of the scene state.
//!
//! All modifications go through `Editor`, which routes undoable ones
//! through the command history. Remote events from the authority are
//! applied directly and never recorded.

use std::sync::Arc;

use vantage_math::{LinearTransform, Vec3};

use crate::commands::{
    despawn_subtree, spawn_entities, CommandContext, CommandError, CommandResult, CreateGroupCommand,
    DeleteBlueprintCommand, DeleteGroupCommand, DisableBlueprintCommand, EditorCommand,
    EnableBlueprintCommand, ReparentCommand, SetObjectNameCommand, SetTransformCommand,
    SetVariationCommand, SpawnBlueprintCommand,
};
use crate::core::{
    detect_changes, Changes, EditorConfig, EntityId, GameObjectTransferData, Scene, SceneEntity,
    SelectionChange, SelectionManager, SelectionMode, UndoHistory,
};
use crate::integration::{AuthoritySink, RendererAdapter, SceneGraph};
use crate::signals::{
    CommandFailed, HistoryAction, HistoryChanged, NotificationBus, ObjectChange, ObjectChanged,
};

pub struct Editor<R: RendererAdapter = SceneGraph> {
    scene: Scene,
    renderer: R,
    history: UndoHistory,
    selection: SelectionManager,
    signals: Arc<NotificationBus>,
    authority: Arc<dyn AuthoritySink>,
    config: EditorConfig,
    /// Entity being dragged, between `on_move_start` and `on_move_end`
    moving: Option<EntityId>,
}

impl<R: RendererAdapter> Editor<R> {
    pub fn new(
        renderer: R,
        signals: Arc<NotificationBus>,
        authority: Arc<dyn AuthoritySink>,
        config: EditorConfig,
    ) -> Self {
        Self {
            scene: Scene::new(),
            renderer,
            history: UndoHistory::with_max_depth(config.history.max_depth),
            selection: SelectionManager::new(),
            signals,
            authority,
            config,
            moving: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Direct renderer access, e.g. for a gizmo moving a node.
    ///
    /// Parentage must only change through commands.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn signals(&self) -> &Arc<NotificationBus> {
        &self.signals
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn moving(&self) -> Option<EntityId> {
        self.moving
    }

    fn context(&mut self) -> (CommandContext<'_>, &mut UndoHistory) {
        (
            CommandContext {
                scene: &mut self.scene,
                renderer: &mut self.renderer,
                authority: self.authority.as_ref(),
                signals: self.signals.as_ref(),
            },
            &mut self.history,
        )
    }

    /// Log and publish a failure that happened before a command could run.
    fn report(&self, description: &str, error: CommandError) -> CommandError {
        log::warn!("{} failed: {}", description, error);
        self.signals.command_failed.emit(&CommandFailed {
            description: description.to_string(),
            error: error.clone(),
        });
        error
    }

    fn entity(&self, id: EntityId, description: &str) -> CommandResult<&SceneEntity> {
        match self.scene.get(id) {
            Some(entity) => Ok(entity),
            None => Err(self.report(description, CommandError::StaleTarget(id))),
        }
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Execute a command and add it to history.
    pub fn execute(&mut self, cmd: impl Into<EditorCommand>) -> CommandResult {
        let (mut cx, history) = self.context();
        let result = history.execute(cmd.into(), &mut cx);
        self.prune_selection();
        result
    }

    /// Undo the last command. `Ok(false)` if there was nothing to undo.
    pub fn undo(&mut self) -> CommandResult<bool> {
        let (mut cx, history) = self.context();
        let result = history.undo(&mut cx);
        self.prune_selection();
        result
    }

    /// Redo the last undone command. `Ok(false)` if there was nothing to redo.
    pub fn redo(&mut self) -> CommandResult<bool> {
        let (mut cx, history) = self.context();
        let result = history.redo(&mut cx);
        self.prune_selection();
        result
    }

    /// Drop all undo and redo entries.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.signals.history_changed.emit(&HistoryChanged {
            action: HistoryAction::Cleared,
            description: String::new(),
            undo_count: 0,
            redo_count: 0,
        });
    }

    // ========================================================================
    // Command-based Operations
    // ========================================================================

    pub fn set_transform(&mut self, id: EntityId, transform: LinearTransform) -> CommandResult {
        let old = self.entity(id, "Set Transform")?.transform;
        self.execute(SetTransformCommand::new(id, transform, old))
    }

    pub fn rename(&mut self, id: EntityId, name: impl Into<String>) -> CommandResult {
        let old = self.entity(id, "Rename")?.name.clone();
        self.execute(SetObjectNameCommand::new(id, name, old))
    }

    pub fn set_variation(&mut self, id: EntityId, variation: u32) -> CommandResult {
        let old = self.entity(id, "Set Variation")?.variation;
        self.execute(SetVariationCommand::new(id, variation, old))
    }

    pub fn reparent(&mut self, id: EntityId, new_parent: Option<EntityId>) -> CommandResult {
        self.execute(ReparentCommand::new(id, new_parent))
    }

    pub fn spawn(&mut self, objects: Vec<GameObjectTransferData>) -> CommandResult {
        self.execute(SpawnBlueprintCommand::new(objects))
    }

    pub fn delete(&mut self, id: EntityId) -> CommandResult {
        self.execute(DeleteBlueprintCommand::new(id))
    }

    pub fn disable(&mut self, id: EntityId) -> CommandResult {
        let data = self.entity(id, "Disable Blueprint")?.to_transfer();
        self.execute(DisableBlueprintCommand::new(data))
    }

    pub fn enable(&mut self, data: GameObjectTransferData) -> CommandResult {
        self.execute(EnableBlueprintCommand::new(data))
    }

    /// Group entities under a new entity placed at their centroid.
    ///
    /// The group takes the parent of the first member.
    pub fn group(&mut self, members: Vec<EntityId>, name: impl Into<String>) -> CommandResult<EntityId> {
        let first = match members.first() {
            Some(&first) => first,
            None => {
                return Err(self.report(
                    "Create Group",
                    CommandError::InvalidOperation("group needs at least one member".to_string()),
                ))
            }
        };
        let parent = self.entity(first, "Create Group")?.parent;

        let positions: Vec<Vec3> = members
            .iter()
            .filter_map(|&m| self.scene.get(m))
            .map(|e| e.transform.trans)
            .collect();
        let centroid = positions.iter().fold(Vec3::ZERO, |acc, &p| acc + p) / positions.len().max(1) as f32;

        let id = EntityId::new();
        let data = GameObjectTransferData::new(id, name, LinearTransform::from_translation(centroid))
            .with_parent(parent);
        self.execute(CreateGroupCommand::new(data, members))?;
        Ok(id)
    }

    pub fn ungroup(&mut self, group_id: EntityId) -> CommandResult {
        self.execute(DeleteGroupCommand::new(group_id))
    }

    /// Copy an entity and its descendants under fresh ids, as one undoable spawn.
    ///
    /// Returns the id of the copy.
    pub fn duplicate(&mut self, id: EntityId) -> CommandResult<EntityId> {
        let copies = match self.scene.clone_subtree(id) {
            Ok(copies) => copies,
            Err(err) => return Err(self.report("Duplicate", err)),
        };
        let root = copies
            .first()
            .map(|e| e.id)
            .ok_or(CommandError::StaleTarget(id))?;

        let objects = copies.iter().map(SceneEntity::to_transfer).collect();
        self.execute(SpawnBlueprintCommand::new(objects))?;
        Ok(root)
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn select(&mut self, id: EntityId, mode: SelectionMode) -> CommandResult {
        self.entity(id, "Select")?;
        let change = self.selection.select(id, mode);
        self.publish_selection(change);
        Ok(())
    }

    pub fn deselect(&mut self, id: EntityId) -> CommandResult {
        self.select(id, SelectionMode::Remove)
    }

    pub fn clear_selection(&mut self) {
        let change = self.selection.clear();
        self.publish_selection(change);
    }

    /// Update entity flags and notify subscribers.
    fn publish_selection(&mut self, change: SelectionChange) {
        for id in change.removed {
            if let Some(entity) = self.scene.get_mut(id) {
                entity.selected = false;
                entity.visible = false;
            }
            self.signals.object_deselected.emit(&id);
        }
        for id in change.added {
            if let Some(entity) = self.scene.get_mut(id) {
                entity.selected = true;
                entity.visible = true;
            }
            self.signals.object_selected.emit(&id);
        }
    }

    /// Drop deleted entities from the selection.
    fn prune_selection(&mut self) {
        let scene = &self.scene;
        let change = self.selection.retain(|id| scene.contains(id));
        self.publish_selection(change);
    }

    // ========================================================================
    // Change detection and move gestures
    // ========================================================================

    /// Compare an entity's committed transform with its renderer world matrix.
    pub fn get_changes(&self, id: EntityId) -> CommandResult<Option<Changes>> {
        let entity = self.entity(id, "Get Changes")?;
        let world = match self.renderer.compose_world_matrix(id) {
            Some(world) => world,
            None => return Err(self.report("Get Changes", CommandError::StaleTarget(id))),
        };

        detect_changes(entity, &world, self.config.changes.epsilon).map_err(|err| {
            log::error!("world matrix of {} cannot be decomposed: {}", id, err);
            CommandError::InvalidTransform(id, err)
        })
    }

    /// Changes of every entity, in hierarchy order.
    pub fn poll_changes(&self) -> Vec<Changes> {
        self.scene
            .ids_in_order()
            .into_iter()
            .filter_map(|id| match self.get_changes(id) {
                Ok(changes) => changes,
                Err(err) => {
                    log::warn!("skipping {} while polling changes: {}", id, err);
                    None
                }
            })
            .collect()
    }

    pub fn on_move_start(&mut self, id: EntityId) -> CommandResult {
        self.entity(id, "Move")?;
        if let Some(previous) = self.moving.replace(id) {
            log::debug!("move of {} superseded by {}", previous, id);
        }
        log::debug!("move start: {}", id);
        Ok(())
    }

    /// Publish the in-progress transform. Returns false if nothing moved.
    pub fn on_move(&mut self, id: EntityId) -> CommandResult<bool> {
        let Some(changes) = self.get_changes(id)? else {
            return Ok(false);
        };
        if let Some(msg) = changes.transform() {
            self.signals.object_changed.emit(&ObjectChanged {
                entity_id: id,
                change: ObjectChange::Transform(msg.transform),
            });
        }
        Ok(true)
    }

    /// Commit the whole gesture as one `SetTransform` command.
    ///
    /// Returns false if the entity ended where it started.
    pub fn on_move_end(&mut self, id: EntityId) -> CommandResult<bool> {
        if self.moving == Some(id) {
            self.moving = None;
        }
        let Some(changes) = self.get_changes(id)? else {
            return Ok(false);
        };
        let Some(msg) = changes.transform() else {
            return Ok(false);
        };

        let old = self.entity(id, "Set Transform")?.transform;
        self.execute(SetTransformCommand::new(id, msg.transform, old))?;
        Ok(true)
    }

    // ========================================================================
    // Remote events
    // ========================================================================

    /// Objects spawned by the authority. Not recorded in history.
    pub fn apply_remote_spawn(&mut self, objects: &[GameObjectTransferData]) -> CommandResult {
        let (mut cx, _) = self.context();
        let result = spawn_entities(&mut cx, objects);
        match &result {
            Ok(()) => log::info!("remote spawn of {} object(s)", objects.len()),
            Err(err) => {
                self.report("Remote Spawn", err.clone());
            }
        }
        result
    }

    /// An object removed or disabled by the authority. Not recorded in history.
    pub fn apply_remote_removal(&mut self, id: EntityId) -> CommandResult {
        let (mut cx, _) = self.context();
        let result = despawn_subtree(&mut cx, id).map(|removed| {
            log::info!("remote removal of {} ({} entities)", id, removed.entities.len());
        });
        if let Err(err) = &result {
            self.report("Remote Removal", err.clone());
        }
        self.prune_selection();
        result
    }

    /// End the session: disconnect all subscribers and drop history.
    pub fn teardown(&mut self) {
        self.signals.teardown();
        self.history.clear();
        self.selection.clear();
        self.moving = None;
        log::info!("editor session torn down");
    }
}

impl<R: RendererAdapter + Default> Editor<R> {
    /// Session with a default renderer and configuration.
    pub fn with_authority(authority: Arc<dyn AuthoritySink>) -> Self {
        Self::new(
            R::default(),
            Arc::new(NotificationBus::new()),
            authority,
            EditorConfig::default(),
        )
    }
}
