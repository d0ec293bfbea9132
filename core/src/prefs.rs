//! Preference store port.
//!
//! The rig persists exactly three things between runs: the participant,
//! the trial number, and the directory the shelf tools last picked from.

use crate::error::RigResult;
use std::collections::HashMap;

pub const PARTICIPANT_ID_KEY: &str = "ParticipantID";
pub const TRIAL_NUMBER_KEY: &str = "TrialNumber";

/// `<namespace>_LastProductDir`
pub fn last_product_dir_key(namespace: &str) -> String {
    format!("{namespace}_LastProductDir")
}

/// Process-wide key/value settings.
///
/// Getters never fail; a missing or unreadable value yields `default`.
pub trait PreferenceStore {
    fn get_int(&self, key: &str, default: i32) -> i32;
    fn set_int(&mut self, key: &str, value: i32) -> RigResult<()>;
    fn get_string(&self, key: &str, default: &str) -> String;
    fn set_string(&mut self, key: &str, value: &str) -> RigResult<()>;
    fn flush(&mut self) -> RigResult<()>;
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for &mut P {
    fn get_int(&self, key: &str, default: i32) -> i32 { (**self).get_int(key, default) }
    fn set_int(&mut self, key: &str, value: i32) -> RigResult<()> { (**self).set_int(key, value) }
    fn get_string(&self, key: &str, default: &str) -> String { (**self).get_string(key, default) }
    fn set_string(&mut self, key: &str, value: &str) -> RigResult<()> { (**self).set_string(key, value) }
    fn flush(&mut self) -> RigResult<()> { (**self).flush() }
}

/// Preferences that live only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryPrefs {
    ints:    HashMap<String, i32>,
    strings: HashMap<String, String>,
    flushes: usize,
}

impl MemoryPrefs {
    pub fn new() -> Self { Self::default() }

    /// How many times `flush` was called.
    pub fn flush_count(&self) -> usize { self.flushes }
}

impl PreferenceStore for MemoryPrefs {
    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.ints.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i32) -> RigResult<()> {
        self.ints.insert(key.to_string(), value);
        Ok(())
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.strings.get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    fn set_string(&mut self, key: &str, value: &str) -> RigResult<()> {
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn flush(&mut self) -> RigResult<()> {
        self.flushes += 1;
        Ok(())
    }
}
