//! Headless renderer graph.
//!
//! Stores one parent-relative matrix per node and composes world matrices
//! on demand. Used by tests and by the replay binary in place of a real
//! renderer.

use std::collections::HashMap;

use vantage_math::{Mat4, Pose};

use super::RendererAdapter;
use crate::core::EntityId;

#[derive(Clone, Debug)]
struct Node {
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    local: Mat4,
}

impl Node {
    fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local: Mat4::IDENTITY,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<EntityId, Node>,
    render_count: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of render requests received so far.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn children_of(&self, id: EntityId) -> &[EntityId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn world(&self, id: EntityId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut world = node.local;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            world = node.local * world;
        }
        Some(world)
    }

    fn unlink_from_parent(&mut self, id: EntityId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|&c| c != id);
            }
        }
    }
}

impl RendererAdapter for SceneGraph {
    fn insert_node(&mut self, id: EntityId) {
        if self.nodes.insert(id, Node::new()).is_some() {
            log::warn!("renderer node {} replaced", id);
        }
    }

    fn remove_node(&mut self, id: EntityId) {
        let Some(world) = self.world(id) else {
            return;
        };
        self.unlink_from_parent(id);
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };

        // Orphans keep their world pose at the root.
        for child in node.children {
            if let Some(child_world) = self.nodes.get(&child).map(|c| world * c.local) {
                if let Some(c) = self.nodes.get_mut(&child) {
                    c.parent = None;
                    c.local = child_world;
                }
            }
        }
    }

    fn contains_node(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    fn detach(&mut self, id: EntityId, from_parent: EntityId) {
        if self.parent_of(id) != Some(from_parent) {
            log::warn!("detach: {} is not a child of {}", id, from_parent);
            return;
        }
        let Some(world) = self.world(id) else {
            return;
        };
        self.unlink_from_parent(id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
            node.local = world;
        }
    }

    fn attach(&mut self, id: EntityId, to_parent: EntityId) {
        if let Some(current) = self.parent_of(id) {
            self.detach(id, current);
        }
        let (Some(world), Some(parent_world)) = (self.world(id), self.world(to_parent)) else {
            log::warn!("attach: missing node {} or {}", id, to_parent);
            return;
        };
        let Some(parent_inverse) = parent_world.inverse() else {
            log::error!("attach: parent {} has a singular world matrix", to_parent);
            return;
        };

        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = Some(to_parent);
            node.local = parent_inverse * world;
        }
        if let Some(parent) = self.nodes.get_mut(&to_parent) {
            parent.children.push(id);
        }
    }

    fn set_local_pose(&mut self, id: EntityId, pose: Pose) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local = pose.to_matrix();
        }
    }

    fn set_local_matrix(&mut self, id: EntityId, matrix: Mat4) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.local = matrix;
        }
    }

    fn local_matrix(&self, id: EntityId) -> Option<Mat4> {
        self.nodes.get(&id).map(|n| n.local)
    }

    fn compose_world_matrix(&self, id: EntityId) -> Option<Mat4> {
        self.world(id)
    }

    fn request_render(&mut self) {
        self.render_count += 1;
        log::trace!("render requested ({})", self.render_count);
    }
}
