//! Shared primitive types used across the rig.

use serde::{Deserialize, Serialize};

/// Identifier carried by every placeable product object and every CSV row.
pub type ProductId = i32;

/// Participant number as written in the trials table.
pub type ParticipantId = i32;

/// 1-based trial sequence number within a participant.
pub type TrialNumber = i32;

/// Number of shelf positions in a trial row.
pub const SHELF_COUNT: usize = 4;

/// Label text shown while no trial is running.
pub const EMPTY_LABEL: &str = "";

/// Opaque handle to an object in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Opaque handle to a text label in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub u32);

/// One shelf position: where the product goes and which label shows its price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfSlot {
    pub anchor: ObjectId,
    #[serde(default)]
    pub label:  Option<LabelId>,
}

/// The fixed, ordered set of shelves a trial fills.
pub type Shelves = [ShelfSlot; SHELF_COUNT];
