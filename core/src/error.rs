use thiserror::Error;

use crate::types::ObjectId;

#[derive(Error, Debug)]
pub enum RigError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("Text source '{name}' unavailable: {reason}")]
    FetchFailed { name: String, reason: String },

    #[error("Unknown scene object {0:?}")]
    UnknownObject(ObjectId),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RigResult<T> = Result<T, RigError>;

/// User-facing failures of the editor-time shelf tools.
/// The Display text is what the operator sees.
#[derive(Error, Debug)]
pub enum StockError {
    #[error("Slot ID '{0}' not found (or not tagged {1}).")]
    SlotNotFound(String, String),

    #[error("Slot '{0}' is already full.\n\nPlease manually remove the items if you wish to replace them.")]
    SlotOccupied(String),

    #[error("No empty slots available!")]
    WarehouseFull,

    #[error("No empty shelves available!")]
    ShelvesFull,

    #[error("No shelves tagged {0} in the scene.")]
    NoShelves(String),

    #[error("Could not load asset '{0}'. Is it outside the project folder?")]
    AssetLoad(String),

    #[error(transparent)]
    Rig(#[from] RigError),
}

pub type StockResult<T> = Result<T, StockError>;
