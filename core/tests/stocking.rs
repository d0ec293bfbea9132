use glam::{Quat, Vec3};
use shelf_trial_core::{
    config::RigConfig,
    error::{RigError, RigResult, StockError},
    headless::{BoxRenderer, MemoryScene},
    inventory::SceneInventory,
    prefs::{last_product_dir_key, MemoryPrefs, PreferenceStore},
    scene::{Aabb, EditorScene, Pose, SceneGraph},
    stocker::{create_product_container, stock_shelf, AssetPicker, SlotRequest},
    types::{LabelId, ObjectId, ProductId},
};

/// Returns a fixed answer and records where each dialog opened.
struct ScriptedPicker {
    answer:     Option<String>,
    start_dirs: Vec<String>,
}

impl ScriptedPicker {
    fn returning(path: &str) -> Self {
        Self { answer: Some(path.to_string()), start_dirs: Vec::new() }
    }

    fn cancelling() -> Self {
        Self { answer: None, start_dirs: Vec::new() }
    }
}

impl AssetPicker for ScriptedPicker {
    fn pick(&mut self, _title: &str, start_dir: &str, extensions: &[&str]) -> Option<String> {
        assert!(extensions.contains(&"prefab"));
        self.start_dirs.push(start_dir.to_string());
        self.answer.clone()
    }
}

const SODA: &str = "Assets/Products/Soda.prefab";

fn soda_renderer() -> BoxRenderer {
    BoxRenderer { center: Vec3::ZERO, half_extents: Vec3::new(0.05, 0.1, 0.1) }
}

/// Slots are created out of order on purpose.
fn warehouse() -> MemoryScene {
    let mut scene = MemoryScene::new();
    for (i, name) in ["Slot10", "Slot2", "Slot1"].iter().enumerate() {
        let slot = scene.add_object(name);
        scene.set_tag(slot, "ProductBundle");
        scene.set_local_pose(slot, Pose::new(Vec3::new(i as f32, 1.0, 0.0), Quat::IDENTITY));
    }
    scene.add_object("NotASlot");
    scene.add_asset(SODA, "Soda", Some(soda_renderer()));
    scene.add_asset("Assets/Products/Empty.prefab", "Empty", None);
    scene.add_asset(
        "Assets/Products/Tall.prefab",
        "Tall",
        Some(BoxRenderer { center: Vec3::new(0.0, 0.0, 0.05), half_extents: Vec3::splat(0.1) }),
    );
    scene
}

#[test]
fn auto_fill_uses_natural_order() {
    let mut scene = warehouse();
    let mut prefs = MemoryPrefs::new();
    let mut picker = ScriptedPicker::returning(SODA);
    let config = RigConfig::default();

    let mut filled = Vec::new();
    for _ in 0..3 {
        let stocked = stock_shelf(&mut scene, &mut prefs, &mut picker, &SlotRequest::NextEmpty, &config)
            .unwrap()
            .unwrap();
        filled.push(scene.name(stocked.slot));
    }
    assert_eq!(filled, vec!["Slot1", "Slot2", "Slot10"]);

    let err = stock_shelf(&mut scene, &mut prefs, &mut picker, &SlotRequest::NextEmpty, &config).unwrap_err();
    assert!(matches!(err, StockError::WarehouseFull));
    assert_eq!(err.to_string(), "No empty slots available!");
}

#[test]
fn stocked_item_is_reset_and_pushed_back() {
    let mut scene = warehouse();
    let mut picker = ScriptedPicker::returning(SODA);

    let stocked = stock_shelf(
        &mut scene,
        &mut MemoryPrefs::new(),
        &mut picker,
        &SlotRequest::Named("Slot2".into()),
        &RigConfig::default(),
    )
    .unwrap()
    .unwrap();

    assert_eq!(scene.parent(stocked.instance), Some(stocked.slot));
    assert_eq!(scene.scale(stocked.instance), Vec3::ONE);
    assert_eq!(scene.local_pose(stocked.instance).rotation, Quat::IDENTITY);

    let push = stocked.z_push.unwrap();
    assert!((push + 0.1).abs() < 1e-6);
    let local = scene.local_position(stocked.instance);
    assert_eq!((local.x, local.y), (0.0, 0.0));
    assert!((local.z + 0.1).abs() < 1e-6);

    // Front face now sits on the slot's Z.
    let slot_z = scene.world_pose(stocked.slot).position.z;
    let front = scene.renderer_bounds(stocked.instance)[0].max.z;
    assert!((front - slot_z).abs() < 1e-6);
}

#[test]
fn off_center_renderer_pushes_further() {
    let mut scene = warehouse();
    let mut picker = ScriptedPicker::returning("Assets/Products/Tall.prefab");

    let stocked = stock_shelf(
        &mut scene,
        &mut MemoryPrefs::new(),
        &mut picker,
        &SlotRequest::NextEmpty,
        &RigConfig::default(),
    )
    .unwrap()
    .unwrap();

    assert!((stocked.z_push.unwrap() + 0.15).abs() < 1e-6);
}

#[test]
fn asset_without_renderers_is_not_aligned() {
    let mut scene = warehouse();
    let mut picker = ScriptedPicker::returning("Assets/Products/Empty.prefab");

    let stocked = stock_shelf(
        &mut scene,
        &mut MemoryPrefs::new(),
        &mut picker,
        &SlotRequest::NextEmpty,
        &RigConfig::default(),
    )
    .unwrap()
    .unwrap();

    assert_eq!(stocked.z_push, None);
    assert_eq!(scene.local_position(stocked.instance), Vec3::ZERO);
}

#[test]
fn named_slot_errors() {
    let mut scene = warehouse();
    let mut prefs = MemoryPrefs::new();
    let mut picker = ScriptedPicker::returning(SODA);
    let config = RigConfig::default();

    let missing = stock_shelf(&mut scene, &mut prefs, &mut picker, &SlotRequest::Named("Slot99".into()), &config)
        .unwrap_err();
    assert!(matches!(missing, StockError::SlotNotFound(ref name, _) if name == "Slot99"));

    let untagged = stock_shelf(&mut scene, &mut prefs, &mut picker, &SlotRequest::Named("NotASlot".into()), &config)
        .unwrap_err();
    assert_eq!(untagged.to_string(), "Slot ID 'NotASlot' not found (or not tagged ProductBundle).");

    let request = SlotRequest::Named("Slot10".into());
    stock_shelf(&mut scene, &mut prefs, &mut picker, &request, &config).unwrap();
    let before = scene.object_count();
    let occupied = stock_shelf(&mut scene, &mut prefs, &mut picker, &request, &config).unwrap_err();
    assert!(matches!(occupied, StockError::SlotOccupied(_)));
    assert_eq!(scene.object_count(), before);

    // Nothing was asked of the operator for the failed requests.
    assert_eq!(picker.start_dirs.len(), 1);
}

#[test]
fn cancel_and_bad_asset_leave_the_scene_alone() {
    let mut scene = warehouse();
    let mut prefs = MemoryPrefs::new();
    let config = RigConfig::default();
    let before = scene.object_count();

    let cancelled = stock_shelf(
        &mut scene,
        &mut prefs,
        &mut ScriptedPicker::cancelling(),
        &SlotRequest::NextEmpty,
        &config,
    )
    .unwrap();
    assert!(cancelled.is_none());
    assert_eq!(scene.object_count(), before);

    let bad = stock_shelf(
        &mut scene,
        &mut prefs,
        &mut ScriptedPicker::returning("/outside/project/Thing.prefab"),
        &SlotRequest::NextEmpty,
        &config,
    )
    .unwrap_err();
    assert!(matches!(bad, StockError::AssetLoad(_)));
    assert_eq!(scene.object_count(), before);
}

#[test]
fn picker_remembers_the_last_directory() {
    let dir = tempfile::tempdir().unwrap();
    let asset = dir.path().join("Soda.prefab");
    let asset = asset.to_str().unwrap();

    let mut scene = warehouse();
    scene.add_asset(asset, "Soda", Some(soda_renderer()));
    let mut prefs = MemoryPrefs::new();
    let mut picker = ScriptedPicker::returning(asset);
    let config = RigConfig::default();

    stock_shelf(&mut scene, &mut prefs, &mut picker, &SlotRequest::NextEmpty, &config).unwrap();
    stock_shelf(&mut scene, &mut prefs, &mut picker, &SlotRequest::NextEmpty, &config).unwrap();

    let remembered = dir.path().to_str().unwrap().to_string();
    assert_eq!(picker.start_dirs, vec!["Assets".to_string(), remembered.clone()]);
    assert_eq!(prefs.get_string(&last_product_dir_key("VRClass"), ""), remembered);
}

#[test]
fn vanished_directory_falls_back_to_asset_root() {
    let mut scene = warehouse();
    let mut prefs = MemoryPrefs::new();
    prefs
        .set_string(&last_product_dir_key("VRClass"), "/no/such/dir/anymore")
        .unwrap();
    let mut picker = ScriptedPicker::returning(SODA);

    stock_shelf(&mut scene, &mut prefs, &mut picker, &SlotRequest::NextEmpty, &RigConfig::default()).unwrap();

    assert_eq!(picker.start_dirs, vec!["Assets".to_string()]);
    assert_eq!(prefs.get_string(&last_product_dir_key("VRClass"), ""), "Assets/Products");
}

fn storeroom() -> MemoryScene {
    let mut scene = MemoryScene::new();
    for name in ["Shelf2", "Shelf1"] {
        let shelf = scene.add_object(name);
        scene.set_tag(shelf, "WarehouseShelf");
    }
    scene.add_asset(SODA, "Soda", Some(soda_renderer()));
    scene
}

#[test]
fn container_tool_builds_indexable_products() {
    let mut scene = storeroom();
    let mut prefs = MemoryPrefs::new();
    let mut picker = ScriptedPicker::returning(SODA);
    let config = RigConfig::default();

    let first = create_product_container(&mut scene, &mut prefs, &mut picker, 7, &config)
        .unwrap()
        .unwrap();
    let second = create_product_container(&mut scene, &mut prefs, &mut picker, 8, &config)
        .unwrap()
        .unwrap();

    assert_eq!(scene.name(first.shelf), "Shelf1");
    assert_eq!(scene.name(second.shelf), "Shelf2");
    assert_eq!(scene.name(first.container), "Soda");
    assert_eq!(scene.parent(first.container), Some(first.shelf));
    assert_eq!(scene.parent(first.art), Some(first.container));
    assert_eq!(scene.product_id(first.container), Some(7));
    assert_eq!(scene.product_id(first.art), None);

    let full = create_product_container(&mut scene, &mut prefs, &mut picker, 9, &config).unwrap_err();
    assert!(matches!(full, StockError::ShelvesFull));

    let inventory = SceneInventory::build(&mut scene);
    assert_eq!(inventory.lookup(7), Some(first.container));
    assert_eq!(inventory.lookup(8), Some(second.container));
}

#[test]
fn container_tool_needs_shelves() {
    let mut scene = MemoryScene::new();
    let err = create_product_container(
        &mut scene,
        &mut MemoryPrefs::new(),
        &mut ScriptedPicker::returning(SODA),
        1,
        &RigConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, StockError::NoShelves(ref tag) if tag == "WarehouseShelf"));
}

/// A scene whose reparenting always fails, like an engine refusing to move
/// an object under a locked prefab.
struct LockedScene(MemoryScene);

impl SceneGraph for LockedScene {
    fn product_objects(&self) -> Vec<ObjectId> { self.0.product_objects() }
    fn product_id(&self, obj: ObjectId) -> Option<ProductId> { self.0.product_id(obj) }
    fn name(&self, obj: ObjectId) -> String { self.0.name(obj) }
    fn set_active(&mut self, obj: ObjectId, active: bool) { self.0.set_active(obj, active) }
    fn is_active(&self, obj: ObjectId) -> bool { self.0.is_active(obj) }
    fn detach(&mut self, obj: ObjectId) { self.0.detach(obj) }
    fn world_pose(&self, obj: ObjectId) -> Pose { self.0.world_pose(obj) }
    fn set_world_pose(&mut self, obj: ObjectId, pose: Pose) { self.0.set_world_pose(obj, pose) }
    fn set_label_text(&mut self, label: LabelId, text: &str) { self.0.set_label_text(label, text) }
}

impl EditorScene for LockedScene {
    fn find_by_name(&self, name: &str) -> Option<ObjectId> { self.0.find_by_name(name) }
    fn find_by_tag(&self, tag: &str) -> Vec<ObjectId> { self.0.find_by_tag(tag) }
    fn tag(&self, obj: ObjectId) -> Option<String> { self.0.tag(obj) }
    fn child_count(&self, obj: ObjectId) -> usize { self.0.child_count(obj) }
    fn instantiate(&mut self, path: &str) -> RigResult<Option<ObjectId>> { self.0.instantiate(path) }
    fn create_empty(&mut self, name: &str) -> ObjectId { self.0.create_empty(name) }
    fn set_parent(&mut self, obj: ObjectId, _parent: ObjectId) -> RigResult<()> {
        Err(RigError::UnknownObject(obj))
    }
    fn set_local_transform(&mut self, obj: ObjectId, position: Vec3, rotation: Quat, scale: Vec3) {
        self.0.set_local_transform(obj, position, rotation, scale)
    }
    fn local_position(&self, obj: ObjectId) -> Vec3 { self.0.local_position(obj) }
    fn set_local_position(&mut self, obj: ObjectId, position: Vec3) { self.0.set_local_position(obj, position) }
    fn renderer_bounds(&self, obj: ObjectId) -> Vec<Aabb> { self.0.renderer_bounds(obj) }
    fn set_product_id(&mut self, obj: ObjectId, id: ProductId) { self.0.set_product_id(obj, id) }
    fn destroy(&mut self, obj: ObjectId) { self.0.destroy(obj) }
}

#[test]
fn failed_reparent_removes_the_new_instance() {
    let mut scene = LockedScene(warehouse());
    let before = scene.0.object_count();

    let err = stock_shelf(
        &mut scene,
        &mut MemoryPrefs::new(),
        &mut ScriptedPicker::returning(SODA),
        &SlotRequest::NextEmpty,
        &RigConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, StockError::Rig(RigError::UnknownObject(_))));
    assert_eq!(scene.0.object_count(), before);
    assert_eq!(scene.0.object_by_name("Soda"), None);
}

#[test]
fn failed_reparent_removes_container_and_art() {
    let mut scene = LockedScene(storeroom());
    let before = scene.0.object_count();

    let err = create_product_container(
        &mut scene,
        &mut MemoryPrefs::new(),
        &mut ScriptedPicker::returning(SODA),
        5,
        &RigConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, StockError::Rig(_)));
    assert_eq!(scene.0.object_count(), before);
    assert!(scene.0.product_objects().is_empty());
}
