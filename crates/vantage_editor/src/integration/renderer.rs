//! Renderer boundary and the transform sync protocol.
//!
//! The renderer keeps parent-relative matrices for display. The model keeps
//! the hierarchy and the last applied world transform. Everything here
//! pushes model state into the renderer; nothing reads hierarchy back.

use vantage_math::{LinearTransform, Mat4, Pose, TransformError};

use crate::core::{EntityId, SceneEntity};

/// What the editor core needs from a 3D renderer.
///
/// `detach` and `attach` must preserve the node's world pose: only the
/// parent-relative matrix changes.
pub trait RendererAdapter {
    /// Create a node at the scene root with an identity pose.
    fn insert_node(&mut self, id: EntityId);

    fn remove_node(&mut self, id: EntityId);

    fn contains_node(&self, id: EntityId) -> bool;

    fn parent_of(&self, id: EntityId) -> Option<EntityId>;

    /// Move `id` from under `from_parent` to the scene root.
    fn detach(&mut self, id: EntityId, from_parent: EntityId);

    /// Move `id` from the scene root under `to_parent`.
    fn attach(&mut self, id: EntityId, to_parent: EntityId);

    /// Replace the node's parent-relative pose.
    fn set_local_pose(&mut self, id: EntityId, pose: Pose);

    /// Replace the node's parent-relative matrix.
    ///
    /// Renderers that only hold position, rotation and scale decompose the
    /// matrix, which drops any shear. The translation is always written
    /// back exactly.
    fn set_local_matrix(&mut self, id: EntityId, matrix: Mat4) {
        let pose = Pose::from_matrix(&matrix).with_position(matrix.get_translation());
        self.set_local_pose(id, pose);
    }

    fn local_matrix(&self, id: EntityId) -> Option<Mat4>;

    fn compose_world_matrix(&self, id: EntityId) -> Option<Mat4>;

    fn request_render(&mut self);
}

/// Apply `transform` as the node's world pose without disturbing its parent link.
///
/// The node is detached to the scene root so the matrix is written in a
/// known frame, then attached back to its parent.
pub fn update_transform(
    renderer: &mut dyn RendererAdapter,
    id: EntityId,
    transform: &LinearTransform,
) -> Result<(), TransformError> {
    transform.validate()?;
    let matrix = transform.to_matrix();

    let parent = renderer.parent_of(id);
    if let Some(parent) = parent {
        renderer.detach(id, parent);
    }

    renderer.set_local_matrix(id, matrix);
    renderer.request_render();

    if let Some(parent) = parent {
        renderer.attach(id, parent);
    }
    renderer.request_render();

    log::debug!("synced transform of {} (parent: {:?})", id, parent);
    Ok(())
}

/// Create the renderer node for a model entity.
///
/// The model parent must already be projected.
pub fn project_entity(
    renderer: &mut dyn RendererAdapter,
    entity: &SceneEntity,
) -> Result<(), TransformError> {
    entity.transform.validate()?;

    renderer.insert_node(entity.id);
    if let Some(parent) = entity.parent {
        if renderer.contains_node(parent) {
            renderer.attach(entity.id, parent);
        } else {
            log::warn!("parent {} of {} has no renderer node", parent, entity.id);
        }
    }
    update_transform(renderer, entity.id, &entity.transform)
}

/// Move a node under `new_parent` (or to the root), keeping its world pose.
pub fn reparent_node(renderer: &mut dyn RendererAdapter, id: EntityId, new_parent: Option<EntityId>) {
    if let Some(old) = renderer.parent_of(id) {
        renderer.detach(id, old);
    }
    if let Some(parent) = new_parent {
        renderer.attach(id, parent);
    }
    renderer.request_render();
    log::debug!("reparented node {} under {:?}", id, new_parent);
}

/// Remove the nodes of a subtree, children first.
pub fn remove_nodes(renderer: &mut dyn RendererAdapter, parent_first: &[EntityId]) {
    for &id in parent_first.iter().rev() {
        renderer.remove_node(id);
    }
    renderer.request_render();
}
