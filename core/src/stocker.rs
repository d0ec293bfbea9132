//! Editor-time shelf tools.
//!
//! `stock_shelf` fills a tagged slot (named, or the next empty one in
//! natural order) with an asset and pushes it back so its front face sits
//! on the shelf edge. `create_product_container` wraps an asset in a new
//! product object on the next empty warehouse shelf.
//!
//! Every failure is a StockError whose text is shown to the operator.
//! A failure never leaves a half-placed object behind.

use crate::{
    config::RigConfig,
    error::{StockError, StockResult},
    natural_sort::natural_cmp,
    prefs::{last_product_dir_key, PreferenceStore},
    scene::{Aabb, EditorScene},
    types::{ObjectId, ProductId},
};
use glam::{Quat, Vec3};
use std::path::Path;

pub const ASSET_EXTENSIONS: &[&str] = &["prefab", "fbx", "obj"];

/// Which slot to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRequest {
    Named(String),
    NextEmpty,
}

impl SlotRequest {
    /// Blank input means "next empty slot".
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            SlotRequest::NextEmpty
        } else {
            SlotRequest::Named(trimmed.to_string())
        }
    }
}

/// The file dialog.
pub trait AssetPicker {
    /// `None` when the operator cancels.
    fn pick(&mut self, title: &str, start_dir: &str, extensions: &[&str]) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stocked {
    pub slot:     ObjectId,
    pub instance: ObjectId,
    /// Z offset applied by alignment; `None` if the asset has no renderers.
    pub z_push:   Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductContainer {
    pub shelf:     ObjectId,
    pub container: ObjectId,
    pub art:       ObjectId,
}

/// Resolve the slot to fill without touching the scene.
pub fn find_target_slot<E>(scene: &E, request: &SlotRequest, tag: &str) -> StockResult<ObjectId>
where
    E: EditorScene + ?Sized,
{
    match request {
        SlotRequest::Named(name) => {
            let slot = scene
                .find_by_name(name)
                .filter(|obj| scene.tag(*obj).as_deref() == Some(tag))
                .ok_or_else(|| StockError::SlotNotFound(name.clone(), tag.to_string()))?;
            if scene.child_count(slot) > 0 {
                return Err(StockError::SlotOccupied(name.clone()));
            }
            Ok(slot)
        }
        SlotRequest::NextEmpty => {
            first_empty(scene, tag).ok_or(StockError::WarehouseFull)
        }
    }
}

/// First childless object carrying `tag`, in natural name order.
pub fn first_empty<E>(scene: &E, tag: &str) -> Option<ObjectId>
where
    E: EditorScene + ?Sized,
{
    let mut slots: Vec<(String, ObjectId)> = scene
        .find_by_tag(tag)
        .into_iter()
        .map(|obj| (scene.name(obj), obj))
        .collect();
    slots.sort_by(|a, b| natural_cmp(&a.0, &b.0));
    slots
        .into_iter()
        .map(|(_, obj)| obj)
        .find(|obj| scene.child_count(*obj) == 0)
}

/// Ask for an asset, starting where the operator last picked from.
/// Remembers the directory of whatever gets picked.
pub fn pick_asset<P, A>(prefs: &mut P, picker: &mut A, config: &RigConfig) -> StockResult<Option<String>>
where
    P: PreferenceStore + ?Sized,
    A: AssetPicker + ?Sized,
{
    let key = last_product_dir_key(&config.prefs_namespace);
    let mut start_dir = prefs.get_string(&key, &config.asset_root);
    if !Path::new(&start_dir).is_dir() {
        start_dir = config.asset_root.clone();
    }

    let Some(path) = picker.pick("Select Product Prefab", &start_dir, ASSET_EXTENSIONS) else {
        return Ok(None);
    };
    if path.is_empty() {
        return Ok(None);
    }

    let dir = Path::new(&path)
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    prefs.set_string(&key, &dir)?;
    prefs.flush()?;
    Ok(Some(path))
}

/// Fill a slot with a picked asset. `Ok(None)` if the picker was cancelled.
pub fn stock_shelf<E, P, A>(
    scene: &mut E,
    prefs: &mut P,
    picker: &mut A,
    request: &SlotRequest,
    config: &RigConfig,
) -> StockResult<Option<Stocked>>
where
    E: EditorScene + ?Sized,
    P: PreferenceStore + ?Sized,
    A: AssetPicker + ?Sized,
{
    let slot = find_target_slot(scene, request, &config.slot_tag)?;

    let Some(path) = pick_asset(prefs, picker, config)? else {
        return Ok(None);
    };

    let instance = scene
        .instantiate(&path)?
        .ok_or_else(|| StockError::AssetLoad(path.clone()))?;
    if let Err(e) = scene.set_parent(instance, slot) {
        scene.destroy(instance);
        return Err(e.into());
    }
    scene.set_local_transform(instance, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);

    let z_push = apply_z_alignment(scene, instance);
    log::info!("Stocked '{}' into slot '{}'", scene.name(instance), scene.name(slot));
    Ok(Some(Stocked { slot, instance, z_push }))
}

/// Push `obj` back along Z so the front (max Z) face of its renderers sits
/// at local Z = 0. X and Y are left at zero. No renderers, no change.
pub fn apply_z_alignment<E>(scene: &mut E, obj: ObjectId) -> Option<f32>
where
    E: EditorScene + ?Sized,
{
    let bounds = scene
        .renderer_bounds(obj)
        .into_iter()
        .reduce(|acc, b| acc.encapsulate(&b))?;

    let push = z_push_for(&bounds, scene.world_pose(obj).position.z);
    scene.set_local_position(obj, Vec3::new(0.0, 0.0, push));
    log::info!("Aligned {}: pushed Z by {push:.4}m to sit inside shelf.", scene.name(obj));
    Some(push)
}

/// `-(bounds.max.z - pivot_z)`
pub fn z_push_for(bounds: &Aabb, pivot_z: f32) -> f32 {
    -(bounds.max.z - pivot_z)
}

/// Wrap a picked asset in a new product object on the next empty warehouse shelf.
pub fn create_product_container<E, P, A>(
    scene: &mut E,
    prefs: &mut P,
    picker: &mut A,
    product_id: ProductId,
    config: &RigConfig,
) -> StockResult<Option<ProductContainer>>
where
    E: EditorScene + ?Sized,
    P: PreferenceStore + ?Sized,
    A: AssetPicker + ?Sized,
{
    if scene.find_by_tag(&config.warehouse_tag).is_empty() {
        return Err(StockError::NoShelves(config.warehouse_tag.clone()));
    }
    let shelf = first_empty(scene, &config.warehouse_tag).ok_or(StockError::ShelvesFull)?;

    let Some(path) = pick_asset(prefs, picker, config)? else {
        return Ok(None);
    };

    let art = scene
        .instantiate(&path)?
        .ok_or_else(|| StockError::AssetLoad(path.clone()))?;

    let name = scene.name(art);
    let container = scene.create_empty(&name);
    let parented = scene
        .set_parent(container, shelf)
        .and_then(|()| scene.set_parent(art, container));
    if let Err(e) = parented {
        scene.destroy(container);
        scene.destroy(art);
        return Err(e.into());
    }

    scene.set_local_transform(container, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);
    scene.set_product_id(container, product_id);
    scene.set_local_transform(art, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE);

    log::info!(
        "Created product {product_id} '{}' on shelf '{}'",
        scene.name(container),
        scene.name(shelf)
    );
    Ok(Some(ProductContainer { shelf, container, art }))
}
