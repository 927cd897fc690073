//! Integration with systems outside the editor core.
//!
//! Bridges between the editor and the renderer graph and the remote
//! authority.

pub mod renderer;
mod scene_graph;
mod authority;

pub use renderer::{project_entity, remove_nodes, reparent_node, update_transform, RendererAdapter};
pub use scene_graph::SceneGraph;
pub use authority::{AuthoritySink, ChannelSink, NullSink, RecordingSink, RemoteCommand};
