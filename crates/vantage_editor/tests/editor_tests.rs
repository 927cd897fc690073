//! Session-level tests: commands, undo/redo, transform sync and wire output.

use std::sync::Arc;

use parking_lot::Mutex;

use vantage_editor::core::ChangeField;
use vantage_editor::signals::{HistoryAction, ObjectChange};
use vantage_editor::{
    CommandError, Editor, EditorConfig, EntityId, GameObjectTransferData, NotificationBus,
    RecordingSink, RemoteCommand, RendererAdapter, SceneGraph, SelectionMode,
};
use vantage_editor::commands::SetTransformCommand;
use vantage_math::{radians, LinearTransform, Pose, Quat, Vec3};

fn session_with(config: EditorConfig) -> (Editor, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let editor = Editor::new(
        SceneGraph::new(),
        Arc::new(NotificationBus::new()),
        sink.clone(),
        config,
    );
    (editor, sink)
}

fn session() -> (Editor, Arc<RecordingSink>) {
    session_with(EditorConfig::default())
}

fn at(x: f32, y: f32, z: f32) -> LinearTransform {
    LinearTransform::from_translation(Vec3::new(x, y, z))
}

fn posed(x: f32, y: f32, z: f32, yaw_degrees: f32) -> LinearTransform {
    LinearTransform::from_pose(
        &Pose::from_position(Vec3::new(x, y, z))
            .with_rotation(Quat::from_rotation_y(radians(yaw_degrees))),
    )
}

fn spawn(editor: &mut Editor, name: &str, transform: LinearTransform, parent: Option<EntityId>) -> EntityId {
    let id = EntityId::new();
    editor
        .spawn(vec![GameObjectTransferData::new(id, name, transform).with_parent(parent)])
        .unwrap();
    id
}

fn world(editor: &Editor, id: EntityId) -> vantage_math::Mat4 {
    editor.renderer().compose_world_matrix(id).unwrap()
}

#[test]
fn test_move_undo_redo() {
    let (mut editor, sink) = session();
    let old = at(0.0, 0.0, 0.0);
    let new = at(1.0, 2.0, 3.0);
    let a = spawn(&mut editor, "A", old, None);
    sink.take();

    editor.set_transform(a, new).unwrap();
    assert_eq!(editor.scene().get(a).unwrap().transform, new);
    assert_eq!(editor.history().undo_count(), 2);
    assert_eq!(editor.history().undo_description(), Some("Set Transform"));

    assert!(editor.undo().unwrap());
    assert_eq!(editor.scene().get(a).unwrap().transform, old);
    assert_eq!(editor.history().undo_count(), 1);
    assert_eq!(editor.history().redo_count(), 1);
    assert!(world(&editor, a).abs_diff_eq(&old.to_matrix(), 1e-5));

    assert!(editor.redo().unwrap());
    assert_eq!(editor.scene().get(a).unwrap().transform, new);
    assert_eq!(editor.history().redo_count(), 0);

    let sent = sink.take();
    let transforms: Vec<LinearTransform> = sent
        .iter()
        .map(|c| match c {
            RemoteCommand::SetTransformCommand { entity_id, transform } => {
                assert_eq!(*entity_id, a);
                *transform
            }
            other => panic!("unexpected {}", other.type_name()),
        })
        .collect();
    assert_eq!(transforms, vec![new, old, new]);
}

#[test]
fn test_undo_runs_in_reverse_order() {
    let (mut editor, _sink) = session();
    let actions = Arc::new(Mutex::new(Vec::new()));
    let seen = actions.clone();
    editor
        .signals()
        .history_changed
        .connect(move |e| seen.lock().push((e.action, e.description.clone())));

    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    editor.rename(a, "B").unwrap();
    editor.set_variation(a, 3).unwrap();

    assert!(editor.undo().unwrap());
    assert_eq!(editor.scene().get(a).unwrap().variation, 0);
    assert_eq!(editor.scene().get(a).unwrap().name, "B");

    assert!(editor.undo().unwrap());
    assert_eq!(editor.scene().get(a).unwrap().name, "A");

    assert!(editor.undo().unwrap());
    assert!(!editor.scene().contains(a));
    assert!(!editor.undo().unwrap());

    let log = actions.lock();
    assert_eq!(log.len(), 6);
    assert_eq!(log[3], (HistoryAction::Undone, "Set Variation".to_string()));
    assert_eq!(log[4], (HistoryAction::Undone, "Rename".to_string()));
    assert_eq!(log[5], (HistoryAction::Undone, "Spawn Blueprint".to_string()));
}

#[test]
fn test_new_command_clears_redo() {
    let (mut editor, _sink) = session();
    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    editor.rename(a, "B").unwrap();
    editor.undo().unwrap();
    assert!(editor.history().can_redo());

    editor.rename(a, "C").unwrap();
    assert!(!editor.history().can_redo());
    assert!(!editor.redo().unwrap());
    assert_eq!(editor.scene().get(a).unwrap().name, "C");
}

#[test]
fn test_repeated_undo_redo_does_not_drift() {
    let (mut editor, _sink) = session();
    let old = posed(1.5, -2.25, 7.0, 33.0);
    let new = posed(-4.0, 0.5, 12.0, 147.0);
    let parent = spawn(&mut editor, "P", posed(3.0, 1.0, -2.0, 61.0), None);
    let a = spawn(&mut editor, "A", old, Some(parent));

    editor.set_transform(a, new).unwrap();
    for _ in 0..100 {
        editor.undo().unwrap();
        editor.redo().unwrap();
    }
    assert_eq!(editor.scene().get(a).unwrap().transform, new);

    editor.undo().unwrap();
    assert_eq!(editor.scene().get(a).unwrap().transform, old);
    assert!(world(&editor, a).abs_diff_eq(&old.to_matrix(), 1e-4));
    assert_eq!(editor.get_changes(a).unwrap(), None);
}

#[test]
fn test_repeated_rename_and_variation_undo_is_exact() {
    let (mut editor, _sink) = session();
    let a = spawn(&mut editor, "Crate", at(0.0, 0.0, 0.0), None);
    editor.rename(a, "Barrel").unwrap();
    editor.set_variation(a, 7).unwrap();

    for _ in 0..100 {
        editor.undo().unwrap();
        editor.undo().unwrap();
        let entity = editor.scene().get(a).unwrap();
        assert_eq!((entity.name.as_str(), entity.variation), ("Crate", 0));

        editor.redo().unwrap();
        editor.redo().unwrap();
    }
    let entity = editor.scene().get(a).unwrap();
    assert_eq!((entity.name.as_str(), entity.variation), ("Barrel", 7));

    editor.undo().unwrap();
    editor.undo().unwrap();
    let entity = editor.scene().get(a).unwrap();
    assert_eq!(entity.name, "Crate");
    assert_eq!(entity.variation, 0);
    assert_eq!(editor.history().undo_count(), 1);
    assert_eq!(editor.history().redo_count(), 2);
}

#[test]
fn test_moving_parent_resyncs_children() {
    let (mut editor, _sink) = session();
    let p = spawn(&mut editor, "P", at(0.0, 0.0, 0.0), None);
    let c = spawn(&mut editor, "C", at(1.0, 0.0, 0.0), Some(p));

    editor.set_transform(p, at(10.0, 0.0, 0.0)).unwrap();
    let carried = editor.scene().get(c).unwrap().transform;
    assert!(carried.trans.abs_diff_eq(Vec3::new(11.0, 0.0, 0.0), 1e-5));
    assert_eq!(editor.get_changes(c).unwrap(), None);
    assert!(editor.poll_changes().is_empty());

    // Undo puts the child back where it was shown, not where it spawned
    let shown = world(&editor, c);
    editor.set_transform(c, at(20.0, 0.0, 0.0)).unwrap();
    editor.undo().unwrap();
    assert_eq!(editor.scene().get(c).unwrap().transform, carried);
    assert!(world(&editor, c).abs_diff_eq(&shown, 1e-5));

    editor.undo().unwrap();
    let child = editor.scene().get(c).unwrap().transform;
    assert!(child.trans.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
    assert_eq!(editor.get_changes(c).unwrap(), None);
}

#[test]
fn test_reparent_preserves_world_pose() {
    let (mut editor, sink) = session();
    let parent = spawn(&mut editor, "P", posed(10.0, 0.0, 0.0, 90.0), None);
    let child_transform = posed(3.0, 1.0, 2.0, 15.0);
    let child = spawn(&mut editor, "C", child_transform, None);
    sink.take();

    editor.reparent(child, Some(parent)).unwrap();

    let entity = editor.scene().get(child).unwrap();
    assert_eq!(entity.parent, Some(parent));
    assert_eq!(entity.transform, child_transform);
    assert_eq!(editor.scene().children(parent), Some(&[child][..]));
    assert_eq!(editor.renderer().parent_of(child), Some(parent));

    assert!(world(&editor, child).abs_diff_eq(&child_transform.to_matrix(), 1e-4));
    let local = editor.renderer().local_matrix(child).unwrap();
    assert!(!local.abs_diff_eq(&child_transform.to_matrix(), 1e-2));
    assert_eq!(editor.get_changes(child).unwrap(), None);

    assert_eq!(
        sink.take(),
        vec![RemoteCommand::SetParentCommand {
            entity_id: child,
            parent: Some(parent),
        }]
    );

    editor.undo().unwrap();
    assert_eq!(editor.scene().get(child).unwrap().parent, None);
    assert_eq!(editor.renderer().parent_of(child), None);
    assert_eq!(editor.scene().roots(), &[parent, child]);
    assert!(world(&editor, child).abs_diff_eq(&child_transform.to_matrix(), 1e-4));
}

#[test]
fn test_reparent_under_descendant_is_rejected() {
    let (mut editor, sink) = session();
    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    let b = spawn(&mut editor, "B", at(1.0, 0.0, 0.0), Some(a));
    sink.take();

    let err = editor.reparent(a, Some(b)).unwrap_err();
    assert!(matches!(err, CommandError::Hierarchy(_)));
    assert_eq!(editor.scene().get(a).unwrap().parent, None);
    assert_eq!(editor.scene().get(b).unwrap().parent, Some(a));
    assert_eq!(editor.history().undo_count(), 2);
    assert!(sink.is_empty());
}

#[test]
fn test_get_changes_tracks_renderer_edits() {
    let (mut editor, _sink) = session();
    let original = at(1.0, 0.0, 0.0);
    let a = spawn(&mut editor, "A", original, None);

    assert_eq!(editor.get_changes(a).unwrap(), None);
    assert_eq!(editor.get_changes(a).unwrap(), None);

    editor
        .renderer_mut()
        .set_local_pose(a, Pose::from_position(Vec3::new(5.0, 0.0, 0.0)));

    let changes = editor.get_changes(a).unwrap().unwrap();
    assert_eq!(changes.fields().collect::<Vec<_>>(), vec![ChangeField::Transform]);
    let msg = changes.transform().unwrap();
    assert_eq!(msg.entity_id, a);
    assert!(msg.transform.trans.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));

    // Uncommitted edits keep showing up
    assert!(editor.get_changes(a).unwrap().is_some());
    assert_eq!(editor.poll_changes().len(), 1);
}

#[test]
fn test_move_gesture_commits_one_command() {
    let (mut editor, sink) = session();
    let original = at(1.0, 0.0, 0.0);
    let a = spawn(&mut editor, "A", original, None);
    sink.take();

    let moves = Arc::new(Mutex::new(0));
    let counter = moves.clone();
    editor.signals().object_changed.connect(move |e| {
        if matches!(e.change, ObjectChange::Transform(_)) {
            *counter.lock() += 1;
        }
    });

    editor.on_move_start(a).unwrap();
    assert_eq!(editor.moving(), Some(a));
    assert!(!editor.on_move(a).unwrap());

    for x in [2.0, 3.0, 4.0] {
        editor
            .renderer_mut()
            .set_local_pose(a, Pose::from_position(Vec3::new(x, 0.0, 0.0)));
        assert!(editor.on_move(a).unwrap());
    }
    assert!(editor.on_move_end(a).unwrap());
    assert_eq!(editor.moving(), None);

    assert_eq!(editor.history().undo_count(), 2);
    assert!(editor.scene().get(a).unwrap().transform.trans.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1e-5));
    assert_eq!(editor.get_changes(a).unwrap(), None);
    assert_eq!(sink.len(), 1);
    // three previews plus the commit
    assert_eq!(*moves.lock(), 4);

    editor.undo().unwrap();
    assert_eq!(editor.scene().get(a).unwrap().transform, original);
    assert_eq!(editor.get_changes(a).unwrap(), None);

    // A gesture that ends in place records nothing
    editor.on_move_start(a).unwrap();
    assert!(!editor.on_move_end(a).unwrap());
    assert_eq!(editor.history().undo_count(), 1);
}

#[test]
fn test_stale_target_fails_without_mutation() {
    let (mut editor, sink) = session();
    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    sink.take();

    let failures = Arc::new(Mutex::new(Vec::new()));
    let seen = failures.clone();
    editor
        .signals()
        .command_failed
        .connect(move |f| seen.lock().push(f.error.clone()));

    let ghost = EntityId::new();
    assert_eq!(
        editor.set_transform(ghost, at(1.0, 0.0, 0.0)),
        Err(CommandError::StaleTarget(ghost))
    );
    assert_eq!(
        editor.execute(SetTransformCommand::new(ghost, at(1.0, 0.0, 0.0), at(0.0, 0.0, 0.0))),
        Err(CommandError::StaleTarget(ghost))
    );
    assert_eq!(
        editor.reparent(a, Some(ghost)),
        Err(CommandError::StaleTarget(ghost))
    );
    assert_eq!(editor.get_changes(ghost), Err(CommandError::StaleTarget(ghost)));

    assert_eq!(failures.lock().len(), 4);
    assert_eq!(editor.history().undo_count(), 1);
    assert_eq!(editor.scene().get(a).unwrap().parent, None);
    assert!(sink.is_empty());
}

#[test]
fn test_undo_after_remote_removal_fails_and_keeps_entry() {
    let (mut editor, _sink) = session();
    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    editor.set_transform(a, at(2.0, 0.0, 0.0)).unwrap();

    editor.apply_remote_removal(a).unwrap();
    assert!(!editor.scene().contains(a));

    assert_eq!(editor.undo(), Err(CommandError::StaleTarget(a)));
    assert_eq!(editor.history().undo_count(), 2);
    assert_eq!(editor.history().redo_count(), 0);
}

#[test]
fn test_invalid_transform_is_rejected() {
    let (mut editor, sink) = session();
    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    sink.take();

    let flat = LinearTransform::new(Vec3::X, Vec3::ZERO, Vec3::Z, Vec3::ZERO);
    let err = editor.set_transform(a, flat).unwrap_err();
    assert!(matches!(err, CommandError::InvalidTransform(id, _) if id == a));

    let nan = at(f32::NAN, 0.0, 0.0);
    assert!(editor.set_transform(a, nan).is_err());

    assert_eq!(editor.scene().get(a).unwrap().transform, at(0.0, 0.0, 0.0));
    assert_eq!(editor.get_changes(a).unwrap(), None);
    assert!(sink.is_empty());
}

#[test]
fn test_disable_and_enable_wire_messages() {
    let (mut editor, sink) = session();
    let a = spawn(&mut editor, "Lamp", at(1.0, 2.0, 3.0), None);
    editor.set_variation(a, 4).unwrap();
    sink.take();

    editor.disable(a).unwrap();
    assert_eq!(sink.take(), vec![RemoteCommand::DisableBlueprintCommand { entity_id: a }]);
    // The authority removes it, not the client
    assert!(editor.scene().contains(a));

    editor.undo().unwrap();
    match sink.take().as_slice() {
        [RemoteCommand::EnableBlueprintCommand { entity_id, name, transform, variation, .. }] => {
            assert_eq!(*entity_id, a);
            assert_eq!(name, "Lamp");
            assert_eq!(*transform, at(1.0, 2.0, 3.0));
            assert_eq!(*variation, 4);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_delete_and_restore_subtree() {
    let (mut editor, sink) = session();
    let p = spawn(&mut editor, "P", at(0.0, 0.0, 0.0), None);
    let c = spawn(&mut editor, "C", at(1.0, 0.0, 0.0), Some(p));
    let removed = Arc::new(Mutex::new(Vec::new()));
    let seen = removed.clone();
    editor
        .signals()
        .object_removed
        .connect(move |e| seen.lock().push(e.entity_id));
    sink.take();

    editor.delete(p).unwrap();
    assert!(editor.scene().is_empty());
    assert!(!editor.renderer().contains_node(c));
    assert_eq!(*removed.lock(), vec![c, p]);
    assert_eq!(sink.take(), vec![RemoteCommand::DeleteBlueprintCommand { entity_id: p }]);

    editor.undo().unwrap();
    assert_eq!(editor.scene().children(p), Some(&[c][..]));
    assert_eq!(editor.renderer().parent_of(c), Some(p));
    assert!(world(&editor, c).abs_diff_eq(&at(1.0, 0.0, 0.0).to_matrix(), 1e-5));
    let types: Vec<&str> = sink.take().iter().map(|c| c.type_name()).collect();
    assert_eq!(types, vec!["SpawnBlueprintCommand", "SpawnBlueprintCommand"]);
}

#[test]
fn test_group_and_ungroup() {
    let (mut editor, sink) = session();
    let a = spawn(&mut editor, "A", at(2.0, 0.0, 0.0), None);
    let b = spawn(&mut editor, "B", at(4.0, 2.0, 0.0), None);
    sink.take();

    let g = editor.group(vec![a, b], "Group").unwrap();
    assert_eq!(editor.scene().roots(), &[g]);
    assert_eq!(editor.scene().children(g), Some(&[a, b][..]));
    assert_eq!(editor.scene().get(g).unwrap().transform.trans, Vec3::new(3.0, 1.0, 0.0));
    assert!(world(&editor, a).abs_diff_eq(&at(2.0, 0.0, 0.0).to_matrix(), 1e-5));
    assert!(editor.poll_changes().is_empty());
    match sink.take().as_slice() {
        [RemoteCommand::CreateGroupCommand { entity_id, members, .. }] => {
            assert_eq!(*entity_id, g);
            assert_eq!(members, &vec![a, b]);
        }
        other => panic!("unexpected {:?}", other),
    }

    editor.undo().unwrap();
    assert!(!editor.scene().contains(g));
    assert_eq!(editor.scene().roots(), &[a, b]);
    assert_eq!(sink.take(), vec![RemoteCommand::DeleteGroupCommand { entity_id: g }]);

    editor.redo().unwrap();
    assert_eq!(editor.scene().children(g), Some(&[a, b][..]));

    editor.ungroup(g).unwrap();
    assert!(!editor.scene().contains(g));
    assert_eq!(editor.scene().roots(), &[a, b]);
    assert!(world(&editor, b).abs_diff_eq(&at(4.0, 2.0, 0.0).to_matrix(), 1e-5));

    editor.undo().unwrap();
    assert_eq!(editor.scene().roots(), &[g]);
    assert_eq!(editor.scene().children(g), Some(&[a, b][..]));
    assert!(editor.poll_changes().is_empty());
}

#[test]
fn test_group_needs_members() {
    let (mut editor, _sink) = session();
    assert!(matches!(
        editor.group(Vec::new(), "Empty"),
        Err(CommandError::InvalidOperation(_))
    ));
    assert_eq!(editor.history().undo_count(), 0);
}

#[test]
fn test_duplicate_uses_fresh_ids() {
    let (mut editor, _sink) = session();
    let p = spawn(&mut editor, "P", at(0.0, 0.0, 0.0), None);
    let c = spawn(&mut editor, "C", at(1.0, 0.0, 0.0), Some(p));

    let copy = editor.duplicate(p).unwrap();
    assert_ne!(copy, p);
    assert_eq!(editor.scene().len(), 4);
    assert_eq!(editor.scene().get(copy).unwrap().name, "P");

    let copy_children = editor.scene().children(copy).unwrap().to_vec();
    assert_eq!(copy_children.len(), 1);
    assert_ne!(copy_children[0], c);
    assert_eq!(editor.scene().children(p), Some(&[c][..]));

    // Editing the copy leaves the source alone
    editor.rename(copy_children[0], "C2").unwrap();
    assert_eq!(editor.scene().get(c).unwrap().name, "C");

    editor.undo().unwrap();
    editor.undo().unwrap();
    assert_eq!(editor.scene().len(), 2);
}

#[test]
fn test_selection_flags_and_pruning() {
    let (mut editor, _sink) = session();
    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    let b = spawn(&mut editor, "B", at(1.0, 0.0, 0.0), None);
    let deselected = Arc::new(Mutex::new(Vec::new()));
    let seen = deselected.clone();
    editor
        .signals()
        .object_deselected
        .connect(move |id| seen.lock().push(*id));

    editor.select(a, SelectionMode::Replace).unwrap();
    let entity = editor.scene().get(a).unwrap();
    assert!(entity.selected && entity.visible);

    editor.select(b, SelectionMode::Add).unwrap();
    assert_eq!(editor.selection().selected(), &[a, b]);

    editor.select(b, SelectionMode::Replace).unwrap();
    assert!(!editor.scene().get(a).unwrap().selected);
    assert_eq!(*deselected.lock(), vec![a]);

    editor.delete(b).unwrap();
    assert!(editor.selection().is_empty());
    assert_eq!(*deselected.lock(), vec![a, b]);

    // Restored entities come back unselected
    editor.undo().unwrap();
    assert!(!editor.scene().get(b).unwrap().selected);
}

#[test]
fn test_remote_events_are_not_recorded() {
    let (mut editor, sink) = session();
    let id = EntityId::new();
    editor
        .apply_remote_spawn(&[GameObjectTransferData::new(id, "Remote", at(5.0, 0.0, 0.0))])
        .unwrap();

    assert!(editor.scene().contains(id));
    assert_eq!(editor.get_changes(id).unwrap(), None);
    assert_eq!(editor.history().undo_count(), 0);
    assert!(sink.is_empty());

    assert_eq!(
        editor.apply_remote_spawn(&[GameObjectTransferData::new(id, "Again", at(0.0, 0.0, 0.0))]),
        Err(CommandError::DuplicateId(id))
    );

    editor.apply_remote_removal(id).unwrap();
    assert!(!editor.scene().contains(id));
    assert_eq!(editor.history().undo_count(), 0);
}

#[test]
fn test_history_depth_from_config() {
    let mut config = EditorConfig::default();
    config.history.max_depth = Some(2);
    let (mut editor, _sink) = session_with(config);

    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    editor.rename(a, "B").unwrap();
    editor.rename(a, "C").unwrap();
    assert_eq!(editor.history().undo_count(), 2);

    while editor.undo().unwrap() {}
    // The spawn fell off the bottom
    assert!(editor.scene().contains(a));
    assert_eq!(editor.scene().get(a).unwrap().name, "A");
}

#[test]
fn test_clear_history_and_teardown() {
    let (mut editor, _sink) = session();
    let cleared = Arc::new(Mutex::new(false));
    let flag = cleared.clone();
    editor.signals().history_changed.connect(move |e| {
        if e.action == HistoryAction::Cleared {
            *flag.lock() = true;
        }
    });
    editor.signals().object_added.connect(|_| {});

    let a = spawn(&mut editor, "A", at(0.0, 0.0, 0.0), None);
    editor.clear_history();
    assert!(*cleared.lock());
    assert!(!editor.history().can_undo());

    editor.select(a, SelectionMode::Replace).unwrap();
    assert_eq!(editor.signals().subscriber_count(), 2);

    editor.teardown();
    assert_eq!(editor.signals().subscriber_count(), 0);
    assert!(editor.selection().is_empty());
    assert!(editor.scene().contains(a));
}
