//! Scene inventory: product id -> the physical object that represents it.

use crate::{
    scene::SceneGraph,
    types::{ObjectId, ProductId},
};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct SceneInventory {
    objects: HashMap<ProductId, ObjectId>,
}

impl SceneInventory {
    /// Index every product object in the scene and hide it.
    /// Nothing is visible until a trial places it.
    pub fn build<S: SceneGraph + ?Sized>(scene: &mut S) -> Self {
        let mut objects = HashMap::new();
        for obj in scene.product_objects() {
            scene.set_active(obj, false);

            let Some(id) = scene.product_id(obj) else { continue };
            if objects.contains_key(&id) {
                log::warn!(
                    "Duplicate Product ID {id} found on object '{}'. Check your scene!",
                    scene.name(obj)
                );
                continue;
            }
            objects.insert(id, obj);
        }
        log::info!("Inventory indexed: found {} physical products.", objects.len());
        Self { objects }
    }

    pub fn lookup(&self, id: ProductId) -> Option<ObjectId> {
        self.objects.get(&id).copied()
    }

    pub fn len(&self) -> usize { self.objects.len() }
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }
}
