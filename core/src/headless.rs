//! Headless scene: an in-memory stand-in for the engine's scene graph.
//!
//! Objects live in an arena addressed by ObjectId. Poses compose through
//! parents by translation and rotation only; scale is tracked per object
//! and only affects renderer bounds. Name and tag queries only see active
//! objects, the product scan sees everything. Destroyed objects keep their
//! slot in the arena so ids stay stable, but no query sees them again.

use crate::{
    error::{RigError, RigResult},
    scene::{Aabb, EditorScene, Pose, SceneGraph},
    types::{LabelId, ObjectId, ProductId, ShelfSlot, Shelves, SHELF_COUNT},
};
use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A box-shaped renderer, in the owning object's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxRenderer {
    #[serde(default)]
    pub center:       Vec3,
    pub half_extents: Vec3,
}

#[derive(Debug, Clone)]
struct SceneObject {
    name:       String,
    tag:        Option<String>,
    active:     bool,
    parent:     Option<ObjectId>,
    children:   Vec<ObjectId>,
    local:      Pose,
    scale:      Vec3,
    product_id: Option<ProductId>,
    renderer:   Option<BoxRenderer>,
    destroyed:  bool,
}

impl SceneObject {
    fn new(name: &str) -> Self {
        Self {
            name:       name.to_string(),
            tag:        None,
            active:     true,
            parent:     None,
            children:   Vec::new(),
            local:      Pose::IDENTITY,
            scale:      Vec3::ONE,
            product_id: None,
            renderer:   None,
            destroyed:  false,
        }
    }
}

#[derive(Debug, Clone)]
struct Asset {
    name:     String,
    renderer: Option<BoxRenderer>,
}

#[derive(Debug, Clone)]
struct Label {
    name: String,
    text: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    labels:  Vec<Label>,
    assets:  HashMap<String, Asset>,
}

impl MemoryScene {
    pub fn new() -> Self { Self::default() }

    // ── Building ──────────────────────────────────────────────

    pub fn add_object(&mut self, name: &str) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(SceneObject::new(name));
        id
    }

    pub fn add_product(&mut self, name: &str, product_id: ProductId) -> ObjectId {
        let id = self.add_object(name);
        self.objects[id.0 as usize].product_id = Some(product_id);
        id
    }

    pub fn add_label(&mut self, name: &str) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(Label { name: name.to_string(), text: String::new() });
        id
    }

    pub fn add_asset(&mut self, path: &str, name: &str, renderer: Option<BoxRenderer>) {
        self.assets.insert(path.to_string(), Asset { name: name.to_string(), renderer });
    }

    pub fn set_tag(&mut self, obj: ObjectId, tag: &str) {
        if let Some(o) = self.get_mut(obj) {
            o.tag = Some(tag.to_string());
        }
    }

    pub fn set_renderer(&mut self, obj: ObjectId, renderer: BoxRenderer) {
        if let Some(o) = self.get_mut(obj) {
            o.renderer = Some(renderer);
        }
    }

    pub fn set_local_pose(&mut self, obj: ObjectId, pose: Pose) {
        if let Some(o) = self.get_mut(obj) {
            o.local = pose;
        }
    }

    pub fn set_scale(&mut self, obj: ObjectId, scale: Vec3) {
        if let Some(o) = self.get_mut(obj) {
            o.scale = scale;
        }
    }

    // ── Inspection ────────────────────────────────────────────

    /// Live objects only.
    pub fn object_count(&self) -> usize {
        self.objects.iter().filter(|o| !o.destroyed).count()
    }

    pub fn label_text(&self, label: LabelId) -> &str {
        self.labels.get(label.0 as usize).map(|l| l.text.as_str()).unwrap_or("")
    }

    pub fn label_by_name(&self, name: &str) -> Option<LabelId> {
        self.labels
            .iter()
            .position(|l| l.name == name)
            .map(|i| LabelId(i as u32))
    }

    /// Name lookup that also sees inactive objects.
    pub fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| !o.destroyed && o.name == name)
            .map(|i| ObjectId(i as u32))
    }

    pub fn parent(&self, obj: ObjectId) -> Option<ObjectId> {
        self.get(obj).and_then(|o| o.parent)
    }

    pub fn children(&self, obj: ObjectId) -> &[ObjectId] {
        self.get(obj).map(|o| o.children.as_slice()).unwrap_or(&[])
    }

    pub fn scale(&self, obj: ObjectId) -> Vec3 {
        self.get(obj).map(|o| o.scale).unwrap_or(Vec3::ONE)
    }

    pub fn local_pose(&self, obj: ObjectId) -> Pose {
        self.get(obj).map(|o| o.local).unwrap_or_default()
    }

    fn get(&self, obj: ObjectId) -> Option<&SceneObject> {
        self.objects.get(obj.0 as usize).filter(|o| !o.destroyed)
    }

    fn get_mut(&mut self, obj: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(obj.0 as usize).filter(|o| !o.destroyed)
    }

    fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        (0..self.objects.len()).map(|i| ObjectId(i as u32))
    }

    fn world_scale(&self, obj: ObjectId) -> Vec3 {
        let mut scale = Vec3::ONE;
        let mut cursor = Some(obj);
        while let Some(id) = cursor {
            let Some(o) = self.get(id) else { break };
            scale *= o.scale;
            cursor = o.parent;
        }
        scale
    }

    fn is_descendant_or_self(&self, candidate: ObjectId, root: ObjectId) -> bool {
        let mut cursor = Some(candidate);
        while let Some(id) = cursor {
            if id == root {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    fn unlink_from_parent(&mut self, obj: ObjectId) {
        if let Some(parent) = self.parent(obj) {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != obj);
            }
        }
        if let Some(o) = self.get_mut(obj) {
            o.parent = None;
        }
    }

    fn collect_subtree(&self, obj: ObjectId, out: &mut Vec<ObjectId>) {
        out.push(obj);
        for child in self.children(obj) {
            self.collect_subtree(*child, out);
        }
    }

    fn world_bounds(&self, obj: ObjectId, renderer: &BoxRenderer) -> Aabb {
        let pose = self.world_pose(obj);
        let scale = self.world_scale(obj);
        let center = pose.position + pose.rotation * (renderer.center * scale);
        let half = renderer.half_extents * scale;
        let m = Mat3::from_quat(pose.rotation);
        let extent = Vec3::new(
            m.row(0).abs().dot(half),
            m.row(1).abs().dot(half),
            m.row(2).abs().dot(half),
        );
        Aabb::from_center_extents(center, extent)
    }
}

impl SceneGraph for MemoryScene {
    fn product_objects(&self) -> Vec<ObjectId> {
        self.ids()
            .filter(|id| self.get(*id).is_some_and(|o| o.product_id.is_some()))
            .collect()
    }

    fn product_id(&self, obj: ObjectId) -> Option<ProductId> {
        self.get(obj).and_then(|o| o.product_id)
    }

    fn name(&self, obj: ObjectId) -> String {
        self.get(obj).map(|o| o.name.clone()).unwrap_or_default()
    }

    fn set_active(&mut self, obj: ObjectId, active: bool) {
        if let Some(o) = self.get_mut(obj) {
            o.active = active;
        }
    }

    fn is_active(&self, obj: ObjectId) -> bool {
        self.get(obj).is_some_and(|o| o.active)
    }

    fn detach(&mut self, obj: ObjectId) {
        if self.parent(obj).is_none() {
            return;
        }
        let pose = self.world_pose(obj);
        let scale = self.world_scale(obj);
        self.unlink_from_parent(obj);
        if let Some(o) = self.get_mut(obj) {
            o.local = pose;
            o.scale = scale;
        }
    }

    fn world_pose(&self, obj: ObjectId) -> Pose {
        let mut chain = Vec::new();
        let mut cursor = Some(obj);
        while let Some(id) = cursor {
            let Some(o) = self.get(id) else { break };
            chain.push(o.local);
            cursor = o.parent;
        }
        chain
            .iter()
            .rev()
            .fold(Pose::IDENTITY, |world, local| world.then(local))
    }

    fn set_world_pose(&mut self, obj: ObjectId, pose: Pose) {
        let parent_world = match self.parent(obj) {
            Some(parent) => self.world_pose(parent),
            None => Pose::IDENTITY,
        };
        let inverse = parent_world.rotation.inverse();
        let local = Pose {
            position: inverse * (pose.position - parent_world.position),
            rotation: inverse * pose.rotation,
        };
        self.set_local_pose(obj, local);
    }

    fn set_label_text(&mut self, label: LabelId, text: &str) {
        if let Some(l) = self.labels.get_mut(label.0 as usize) {
            l.text = text.to_string();
        }
    }
}

impl EditorScene for MemoryScene {
    fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.ids()
            .find(|id| self.get(*id).is_some_and(|o| o.active && o.name == name))
    }

    fn find_by_tag(&self, tag: &str) -> Vec<ObjectId> {
        self.ids()
            .filter(|id| {
                self.get(*id)
                    .is_some_and(|o| o.active && o.tag.as_deref() == Some(tag))
            })
            .collect()
    }

    fn tag(&self, obj: ObjectId) -> Option<String> {
        self.get(obj).and_then(|o| o.tag.clone())
    }

    fn child_count(&self, obj: ObjectId) -> usize {
        self.children(obj).len()
    }

    fn instantiate(&mut self, path: &str) -> RigResult<Option<ObjectId>> {
        let Some(asset) = self.assets.get(path).cloned() else {
            return Ok(None);
        };
        let id = self.add_object(&asset.name);
        if let Some(renderer) = asset.renderer {
            self.set_renderer(id, renderer);
        }
        Ok(Some(id))
    }

    fn create_empty(&mut self, name: &str) -> ObjectId {
        self.add_object(name)
    }

    fn set_parent(&mut self, obj: ObjectId, parent: ObjectId) -> RigResult<()> {
        for id in [obj, parent] {
            if self.get(id).is_none() {
                return Err(RigError::UnknownObject(id));
            }
        }
        if self.is_descendant_or_self(parent, obj) {
            return Err(anyhow::anyhow!(
                "cannot parent '{}' under its own descendant '{}'",
                self.name(obj),
                self.name(parent)
            )
            .into());
        }
        let world = self.world_pose(obj);
        self.unlink_from_parent(obj);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(obj);
        }
        if let Some(o) = self.get_mut(obj) {
            o.parent = Some(parent);
        }
        // Keep the world pose, as a reparent in the editor does.
        self.set_world_pose(obj, world);
        Ok(())
    }

    fn set_local_transform(&mut self, obj: ObjectId, position: Vec3, rotation: Quat, scale: Vec3) {
        if let Some(o) = self.get_mut(obj) {
            o.local = Pose { position, rotation };
            o.scale = scale;
        }
    }

    fn local_position(&self, obj: ObjectId) -> Vec3 {
        self.local_pose(obj).position
    }

    fn set_local_position(&mut self, obj: ObjectId, position: Vec3) {
        if let Some(o) = self.get_mut(obj) {
            o.local.position = position;
        }
    }

    fn renderer_bounds(&self, obj: ObjectId) -> Vec<Aabb> {
        let mut subtree = Vec::new();
        if self.get(obj).is_some() {
            self.collect_subtree(obj, &mut subtree);
        }
        subtree
            .into_iter()
            .filter_map(|id| {
                let renderer = self.get(id)?.renderer?;
                Some(self.world_bounds(id, &renderer))
            })
            .collect()
    }

    fn set_product_id(&mut self, obj: ObjectId, id: ProductId) {
        if let Some(o) = self.get_mut(obj) {
            o.product_id = Some(id);
        }
    }
    fn destroy(&mut self, obj: ObjectId) {
        if self.get(obj).is_none() {
            return;
        }
        let mut subtree = Vec::new();
        self.collect_subtree(obj, &mut subtree);
        self.unlink_from_parent(obj);
        for id in subtree {
            if let Some(o) = self.get_mut(id) {
                o.destroyed = true;
                o.children.clear();
            }
        }
    }
}

// ── JSON scene description ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default = "default_rotation")]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub renderer: Option<BoxRenderer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetDef {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub renderer: Option<BoxRenderer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShelfDef {
    pub anchor: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// A scene file: objects (parents by name, listed before their children),
/// labels, the asset library and optionally the trial shelves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneDescription {
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assets: Vec<AssetDef>,
    #[serde(default)]
    pub shelves: Vec<ShelfDef>,
}

fn default_active() -> bool { true }
fn default_rotation() -> Quat { Quat::IDENTITY }
fn default_scale() -> Vec3 { Vec3::ONE }

pub struct LoadedScene {
    pub scene:   MemoryScene,
    pub shelves: Option<Shelves>,
}

impl SceneDescription {
    pub fn from_json(text: &str) -> RigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn build(&self) -> RigResult<LoadedScene> {
        let mut scene = MemoryScene::new();
        let mut by_name: HashMap<&str, ObjectId> = HashMap::new();

        for def in &self.objects {
            let id = scene.add_object(&def.name);
            if let Some(o) = scene.get_mut(id) {
                o.tag = def.tag.clone();
                o.active = def.active;
                o.product_id = def.product_id;
                o.local = Pose::new(def.position, def.rotation.normalize());
                o.scale = def.scale;
                o.renderer = def.renderer;
            }
            if let Some(parent_name) = &def.parent {
                let parent = *by_name.get(parent_name.as_str()).ok_or_else(|| {
                    anyhow::anyhow!("object '{}' names unknown parent '{parent_name}'", def.name)
                })?;
                // Positions in the file are local to the parent.
                scene.unlink_from_parent(id);
                if let Some(p) = scene.get_mut(parent) {
                    p.children.push(id);
                }
                if let Some(o) = scene.get_mut(id) {
                    o.parent = Some(parent);
                }
            }
            by_name.entry(def.name.as_str()).or_insert(id);
        }

        for label in &self.labels {
            scene.add_label(label);
        }
        for asset in &self.assets {
            scene.add_asset(&asset.path, &asset.name, asset.renderer);
        }

        let shelves = if self.shelves.is_empty() {
            None
        } else {
            Some(self.resolve_shelves(&scene, &by_name)?)
        };
        Ok(LoadedScene { scene, shelves })
    }

    fn resolve_shelves(&self, scene: &MemoryScene, by_name: &HashMap<&str, ObjectId>) -> RigResult<Shelves> {
        if self.shelves.len() != SHELF_COUNT {
            return Err(anyhow::anyhow!(
                "scene defines {} shelves, expected {SHELF_COUNT}",
                self.shelves.len()
            )
            .into());
        }
        let mut slots = Vec::with_capacity(SHELF_COUNT);
        for def in &self.shelves {
            let anchor = *by_name
                .get(def.anchor.as_str())
                .ok_or_else(|| anyhow::anyhow!("shelf anchor '{}' not in scene", def.anchor))?;
            let label = match &def.label {
                Some(name) => Some(
                    scene
                        .label_by_name(name)
                        .ok_or_else(|| anyhow::anyhow!("shelf label '{name}' not in scene"))?,
                ),
                None => None,
            };
            slots.push(ShelfSlot { anchor, label });
        }
        slots
            .try_into()
            .map_err(|_| anyhow::anyhow!("shelf count mismatch").into())
    }
}
