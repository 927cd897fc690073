//! Vantage Scene Editor Core
//!
//! The client-side command and undo engine of the Vantage scene editor,
//! with the transform sync between the scene model and the renderer graph.
//!
//! ## Features
//!
//! - **Scene Model**: Entities with world-space transforms and parent/child links
//! - **Transform Sync**: Reparent and pose renderer nodes without world drift
//! - **Change Detection**: Compare the model with the renderer world matrices
//! - **Undo/Redo**: Bounded LIFO command history
//! - **Authority Sink**: Every executed or undone command is mirrored as a wire message
//! - **Notification Bus**: Typed signals for UI panels and tooling
//!
//! ## Architecture
//!
//! ```text
//! User Input → Editor → Command → Scene + Renderer → AuthoritySink
//!                                       ↓
//!                               NotificationBus
//! ```
//!
//! All undoable modifications go through the command system.

pub mod core;
pub mod commands;
pub mod integration;
pub mod signals;
pub mod editor;

// Re-export commonly used types
pub use core::{
    Changes,
    EditorConfig,
    EntityId,
    GameObjectTransferData,
    Scene,
    SceneEntity,
    SelectionManager,
    SelectionMode,
    UndoHistory,
};

pub use commands::{
    Command,
    CommandError,
    CommandKind,
    CommandResult,
    EditorCommand,
};

pub use integration::{
    AuthoritySink,
    ChannelSink,
    NullSink,
    RecordingSink,
    RemoteCommand,
    RendererAdapter,
    SceneGraph,
};

pub use editor::Editor;
pub use signals::NotificationBus;

/// Editor core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "Vantage Editor";
