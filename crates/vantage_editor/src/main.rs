//! Vantage Replay
//!
//! Runs a scripted editing session against the in-memory scene graph and
//! prints every wire message the session would send to the authority, one
//! JSON object per line.
//!
//! Run with: cargo run -p vantage_editor -- [--config editor.toml] script.json
//!
//! A script is a JSON array of steps. Entities are named by script keys:
//!
//! ```json
//! [
//!   { "op": "spawn", "key": "table", "name": "Table", "position": [0, 0, 0] },
//!   { "op": "spawn", "key": "cup", "name": "Cup", "position": [1, 1, 0], "parent": "table" },
//!   { "op": "move", "key": "table", "position": [4, 0, 0], "yawDegrees": 90 },
//!   { "op": "undo" }
//! ]
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::Deserialize;
use thiserror::Error;

use vantage_editor::core::ConfigError;
use vantage_editor::{
    ChannelSink, CommandError, Editor, EditorConfig, EntityId, GameObjectTransferData,
    NotificationBus, RemoteCommand, RendererAdapter, SceneGraph, SelectionMode,
};
use vantage_math::{radians, LinearTransform, Pose, Quat, Vec3};

#[derive(Debug, Error)]
enum ReplayError {
    #[error("usage: vantage-replay [--config <path>] <script.json>")]
    Usage,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("step {step}: unknown entity key '{key}'")]
    UnknownKey { step: usize, key: String },

    #[error("step {step}: {source}")]
    Command {
        step: usize,
        #[source]
        source: CommandError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum Step {
    Spawn {
        key: String,
        name: String,
        #[serde(default)]
        position: [f32; 3],
        #[serde(default)]
        yaw_degrees: f32,
        parent: Option<String>,
        #[serde(default)]
        variation: u32,
    },
    Move {
        key: String,
        position: [f32; 3],
        #[serde(default)]
        yaw_degrees: f32,
    },
    /// Drag the renderer node directly, then commit the gesture.
    Drag {
        key: String,
        position: [f32; 3],
    },
    Rename {
        key: String,
        name: String,
    },
    SetVariation {
        key: String,
        variation: u32,
    },
    Reparent {
        key: String,
        parent: Option<String>,
    },
    Delete {
        key: String,
    },
    Disable {
        key: String,
    },
    Enable {
        key: String,
    },
    Duplicate {
        key: String,
        #[serde(rename = "as")]
        copy: String,
    },
    Group {
        key: String,
        name: String,
        members: Vec<String>,
    },
    Ungroup {
        key: String,
    },
    Select {
        key: String,
        #[serde(default)]
        add: bool,
    },
    Undo,
    Redo,
}

fn pose_transform(position: [f32; 3], yaw_degrees: f32) -> LinearTransform {
    let pose = Pose::from_position(Vec3::from(position))
        .with_rotation(Quat::from_rotation_y(radians(yaw_degrees)));
    LinearTransform::from_pose(&pose)
}

struct Replay {
    editor: Editor,
    outbox: Receiver<RemoteCommand>,
    keys: HashMap<String, EntityId>,
    /// Snapshots taken at disable time, used by `enable`
    disabled: HashMap<EntityId, GameObjectTransferData>,
}

impl Replay {
    fn new(config: EditorConfig) -> Self {
        let (sink, outbox) = ChannelSink::unbounded();
        let editor = Editor::new(
            SceneGraph::new(),
            Arc::new(NotificationBus::new()),
            Arc::new(sink),
            config,
        );
        Self {
            editor,
            outbox,
            keys: HashMap::new(),
            disabled: HashMap::new(),
        }
    }

    fn id(&self, step: usize, key: &str) -> Result<EntityId, ReplayError> {
        self.keys.get(key).copied().ok_or_else(|| ReplayError::UnknownKey {
            step,
            key: key.to_string(),
        })
    }

    fn run(&mut self, step: usize, op: Step) -> Result<(), ReplayError> {
        let wrap = |source: CommandError| ReplayError::Command { step, source };

        match op {
            Step::Spawn { key, name, position, yaw_degrees, parent, variation } => {
                let parent = parent.map(|p| self.id(step, &p)).transpose()?;
                let id = EntityId::new();
                let data = GameObjectTransferData::new(id, name, pose_transform(position, yaw_degrees))
                    .with_parent(parent)
                    .with_variation(variation);
                self.editor.spawn(vec![data]).map_err(wrap)?;
                self.keys.insert(key, id);
            }
            Step::Move { key, position, yaw_degrees } => {
                let id = self.id(step, &key)?;
                self.editor
                    .set_transform(id, pose_transform(position, yaw_degrees))
                    .map_err(wrap)?;
            }
            Step::Drag { key, position } => {
                let id = self.id(step, &key)?;
                self.editor.on_move_start(id).map_err(wrap)?;
                let world = pose_transform(position, 0.0).to_matrix();
                let local = match self.editor.scene().get(id).and_then(|e| e.parent) {
                    Some(parent) => self
                        .editor
                        .renderer()
                        .compose_world_matrix(parent)
                        .and_then(|m| m.inverse())
                        .map(|inv| inv * world)
                        .unwrap_or(world),
                    None => world,
                };
                self.editor
                    .renderer_mut()
                    .set_local_pose(id, Pose::from_matrix(&local));
                self.editor.on_move(id).map_err(wrap)?;
                if !self.editor.on_move_end(id).map_err(wrap)? {
                    log::info!("drag of '{}' ended in place", key);
                }
            }
            Step::Rename { key, name } => {
                let id = self.id(step, &key)?;
                self.editor.rename(id, name).map_err(wrap)?;
            }
            Step::SetVariation { key, variation } => {
                let id = self.id(step, &key)?;
                self.editor.set_variation(id, variation).map_err(wrap)?;
            }
            Step::Reparent { key, parent } => {
                let id = self.id(step, &key)?;
                let parent = parent.map(|p| self.id(step, &p)).transpose()?;
                self.editor.reparent(id, parent).map_err(wrap)?;
            }
            Step::Delete { key } => {
                let id = self.id(step, &key)?;
                self.editor.delete(id).map_err(wrap)?;
            }
            Step::Disable { key } => {
                let id = self.id(step, &key)?;
                if let Some(entity) = self.editor.scene().get(id) {
                    self.disabled.insert(id, entity.to_transfer());
                }
                self.editor.disable(id).map_err(wrap)?;
            }
            Step::Enable { key } => {
                let id = self.id(step, &key)?;
                let data = match self.disabled.remove(&id) {
                    Some(data) => data,
                    None => match self.editor.scene().get(id) {
                        Some(entity) => entity.to_transfer(),
                        None => return Err(wrap(CommandError::StaleTarget(id))),
                    },
                };
                self.editor.enable(data).map_err(wrap)?;
            }
            Step::Duplicate { key, copy } => {
                let id = self.id(step, &key)?;
                let copy_id = self.editor.duplicate(id).map_err(wrap)?;
                self.keys.insert(copy, copy_id);
            }
            Step::Group { key, name, members } => {
                let members = members
                    .iter()
                    .map(|m| self.id(step, m))
                    .collect::<Result<Vec<_>, _>>()?;
                let id = self.editor.group(members, name).map_err(wrap)?;
                self.keys.insert(key, id);
            }
            Step::Ungroup { key } => {
                let id = self.id(step, &key)?;
                self.editor.ungroup(id).map_err(wrap)?;
            }
            Step::Select { key, add } => {
                let id = self.id(step, &key)?;
                let mode = if add { SelectionMode::Add } else { SelectionMode::Replace };
                self.editor.select(id, mode).map_err(wrap)?;
            }
            Step::Undo => {
                if !self.editor.undo().map_err(wrap)? {
                    log::info!("step {}: nothing to undo", step);
                }
            }
            Step::Redo => {
                if !self.editor.redo().map_err(wrap)? {
                    log::info!("step {}: nothing to redo", step);
                }
            }
        }
        Ok(())
    }

    /// Print queued wire messages.
    fn flush(&self) -> Result<(), ReplayError> {
        for command in self.outbox.try_iter() {
            println!("{}", command.to_json()?);
        }
        Ok(())
    }
}

fn parse_args(args: &[String]) -> Result<(Option<PathBuf>, PathBuf), ReplayError> {
    let mut config = None;
    let mut script = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(iter.next().ok_or(ReplayError::Usage)?)),
            flag if flag.starts_with("--") => return Err(ReplayError::Usage),
            path if script.is_none() => script = Some(PathBuf::from(path)),
            _ => return Err(ReplayError::Usage),
        }
    }

    Ok((config, script.ok_or(ReplayError::Usage)?))
}

fn replay(config: EditorConfig, script: &Path) -> Result<(), ReplayError> {
    let content = std::fs::read_to_string(script)?;
    let steps: Vec<Step> = serde_json::from_str(&content)?;
    log::info!("Replaying {} step(s) from {}", steps.len(), script.display());

    let mut replay = Replay::new(config);
    for (step, op) in steps.into_iter().enumerate() {
        log::debug!("step {}: {:?}", step, op);
        let result = replay.run(step, op);
        replay.flush()?;
        result?;
    }

    let editor = &replay.editor;
    log::info!(
        "Done: {} entities, {} undo / {} redo entries",
        editor.scene().len(),
        editor.history().undo_count(),
        editor.history().redo_count()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let result = parse_args(&args).and_then(|(config_path, script)| {
        let config = EditorConfig::load(config_path.as_deref())?;

        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
        )
        .init();

        replay(config, &script)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vantage-replay: {}", err);
            ExitCode::FAILURE
        }
    }
}
