//! Shelf trial rig: CSV-driven shopping trials over an abstract scene.

pub mod config;
pub mod csv_table;
pub mod error;
pub mod event;
pub mod headless;
pub mod inventory;
pub mod natural_sort;
pub mod prefs;
pub mod price_index;
pub mod scene;
pub mod source;
pub mod stocker;
pub mod store;
pub mod trial_runner;
pub mod trial_sequence;
pub mod types;
