//! Scene capability traits.
//!
//! RULE: The rig never touches engine types.
//! Everything it needs from the scene goes through SceneGraph (runtime)
//! or EditorScene (editor-time tools).

use crate::{
    error::RigResult,
    types::{LabelId, ObjectId, ProductId},
};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space position and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose { position: Vec3::ZERO, rotation: Quat::IDENTITY };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Compose a child's local pose onto this (parent) pose.
    pub fn then(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: self.rotation * local.rotation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self { Self::IDENTITY }
}

/// Axis-aligned world bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self { min: center - half_extents, max: center + half_extents }
    }

    pub fn encapsulate(&self, other: &Aabb) -> Aabb {
        Aabb { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    pub fn size(&self) -> Vec3 { self.max - self.min }
}

/// What the trial runner needs from the scene.
pub trait SceneGraph {
    /// Every object carrying a product id, inactive ones included.
    fn product_objects(&self) -> Vec<ObjectId>;

    fn product_id(&self, obj: ObjectId) -> Option<ProductId>;

    fn name(&self, obj: ObjectId) -> String;

    fn set_active(&mut self, obj: ObjectId, active: bool);

    fn is_active(&self, obj: ObjectId) -> bool;

    /// Move to the scene root, keeping the world pose.
    fn detach(&mut self, obj: ObjectId);

    fn world_pose(&self, obj: ObjectId) -> Pose;

    fn set_world_pose(&mut self, obj: ObjectId, pose: Pose);

    fn set_label_text(&mut self, label: LabelId, text: &str);
}

/// The extra surface the editor-time shelf tools use.
pub trait EditorScene: SceneGraph {
    fn find_by_name(&self, name: &str) -> Option<ObjectId>;

    fn find_by_tag(&self, tag: &str) -> Vec<ObjectId>;

    fn tag(&self, obj: ObjectId) -> Option<String>;

    fn child_count(&self, obj: ObjectId) -> usize;

    /// Instantiate the asset at `path`. `Ok(None)` when the asset cannot be loaded.
    fn instantiate(&mut self, path: &str) -> RigResult<Option<ObjectId>>;

    fn create_empty(&mut self, name: &str) -> ObjectId;

    fn set_parent(&mut self, obj: ObjectId, parent: ObjectId) -> RigResult<()>;

    fn set_local_transform(&mut self, obj: ObjectId, position: Vec3, rotation: Quat, scale: Vec3);

    fn local_position(&self, obj: ObjectId) -> Vec3;

    fn set_local_position(&mut self, obj: ObjectId, position: Vec3);

    /// World bounds of every renderer under `obj` (itself included).
    fn renderer_bounds(&self, obj: ObjectId) -> Vec<Aabb>;

    fn set_product_id(&mut self, obj: ObjectId, id: ProductId);

    /// Remove `obj` and everything under it. Unknown ids are ignored.
    fn destroy(&mut self, obj: ObjectId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_composition_rotates_child_offset() {
        let parent = Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let child = Pose::new(Vec3::new(0.0, 0.0, 1.0), Quat::IDENTITY);
        let world = parent.then(&child);
        assert!((world.position - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn aabb_encapsulate_grows_both_corners() {
        let a = Aabb::from_center_extents(Vec3::ZERO, Vec3::splat(0.5));
        let b = Aabb::from_center_extents(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(0.5));
        let c = a.encapsulate(&b);
        assert_eq!(c.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(c.max, Vec3::new(1.5, 0.5, 0.5));
        assert_eq!(c.size(), Vec3::new(2.0, 1.0, 1.0));
    }
}
