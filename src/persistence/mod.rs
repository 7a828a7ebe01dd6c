//! String key/value persistence port
//!
//! The core only ever sees the [`Storage`] trait; LocalStorage backs it in
//! the browser and an in-memory map everywhere else. Every failure here is
//! soft: corrupt or missing values fall back to defaults and the
//! simulation tick never observes a storage error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::sim::milestones::Split;
use crate::sim::state::SimState;

/// Storage keys for every persisted value
pub mod keys {
    /// Serialized [`super::RunSnapshot`]
    pub const RUN_SNAPSHOT: &str = "deepscroll_run";
    /// Single best-depth scalar (plain number)
    pub const BEST_DEPTH: &str = "deepscroll_best_depth";
    /// Serialized settings struct (carries the inertia flag)
    pub const SETTINGS: &str = "deepscroll_settings";
    /// Serialized calibration factor + source
    pub const CALIBRATION: &str = "deepscroll_calibration";
    /// Serialized array of unlocked achievement keys
    pub const ACHIEVEMENTS: &str = "deepscroll_achievements";
}

/// Minimal string key/value store
pub trait Storage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory backend for native builds and tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
    }
}

/// Browser LocalStorage backend
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn raw() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok()).flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn read(&self, key: &str) -> Option<String> {
        Self::raw().and_then(|s| s.get_item(key).ok()).flatten()
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Some(storage) = Self::raw() {
            // Quota errors are swallowed: persistence is best-effort
            if storage.set_item(key, value).is_err() {
                log::warn!("LocalStorage write failed for {key}");
            }
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = Self::raw() {
            let _ = storage.remove_item(key);
        }
    }
}

/// Serialized mid-run state, written at bounded frequency while a run is
/// active and deleted the moment it grounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub depth: f32,
    pub velocity: f32,
    pub elapsed_secs: f64,
    pub splits: Vec<Split>,
    pub passed_milestone_thresholds: Vec<f32>,
    pub total_cm: f32,
    pub max_speed_cms: f32,
    pub max_accel_cms2: f32,
    pub avg_speed_cms: f32,
    pub direction_changes: u32,
    pub unlocked_achievement_keys: Vec<String>,
    pub saved_at_ms: f64,
}

impl RunSnapshot {
    /// Capture the current run for later resume
    pub fn capture(state: &SimState, unlocked_keys: &[String], now_ms: f64) -> Self {
        Self {
            depth: state.depth,
            velocity: state.velocity,
            elapsed_secs: state.elapsed_secs,
            splits: state.milestones.splits.clone(),
            passed_milestone_thresholds: state.milestones.passed.clone(),
            total_cm: state.stats.total_cm,
            max_speed_cms: state.stats.max_speed_cms,
            max_accel_cms2: state.stats.max_accel_cms2,
            avg_speed_cms: state.stats.avg_speed_cms,
            direction_changes: state.stats.direction_changes,
            unlocked_achievement_keys: unlocked_keys.to_vec(),
            saved_at_ms: now_ms,
        }
    }

    /// Read the stored snapshot, discarding it if corrupt
    pub fn load(storage: &mut dyn Storage) -> Option<Self> {
        let json = storage.read(keys::RUN_SNAPSHOT)?;
        match serde_json::from_str::<RunSnapshot>(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                log::warn!("Discarding corrupt run snapshot: {err}");
                storage.remove(keys::RUN_SNAPSHOT);
                None
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        match serde_json::to_string(self) {
            Ok(json) => storage.write(keys::RUN_SNAPSHOT, &json),
            Err(err) => log::warn!("Run snapshot serialization failed: {err}"),
        }
    }

    pub fn clear(storage: &mut dyn Storage) {
        storage.remove(keys::RUN_SNAPSHOT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert!(storage.read("k").is_none());
        storage.write("k", "v");
        assert_eq!(storage.read("k").as_deref(), Some("v"));
        storage.remove("k");
        assert!(storage.read("k").is_none());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut state = SimState::new();
        state.start_run(1000.0);
        state.depth = 500.0;
        state.velocity = 10.0;
        state.elapsed_secs = 12.5;
        state.stats.total_cm = 620.0;
        state.milestones.evaluate(620.0, 12.5, &crate::consts::MILESTONES_CM);

        let unlocked = vec!["first_meter".to_string()];
        RunSnapshot::capture(&state, &unlocked, 99_000.0).save(&mut storage);

        let loaded = RunSnapshot::load(&mut storage).expect("snapshot present");
        assert_eq!(loaded.depth, 500.0);
        assert_eq!(loaded.velocity, 10.0);
        assert_eq!(loaded.elapsed_secs, 12.5);
        assert_eq!(loaded.splits.len(), 2);
        assert_eq!(loaded.passed_milestone_thresholds, vec![100.0, 500.0]);
        assert_eq!(loaded.unlocked_achievement_keys, unlocked);
        assert_eq!(loaded.saved_at_ms, 99_000.0);
    }

    #[test]
    fn test_corrupt_snapshot_is_discarded() {
        let mut storage = MemoryStorage::new();
        storage.write(keys::RUN_SNAPSHOT, "{not valid json");
        assert!(RunSnapshot::load(&mut storage).is_none());
        // The bad value is gone, not retried forever
        assert!(storage.read(keys::RUN_SNAPSHOT).is_none());
    }

    #[test]
    fn test_clear_removes_snapshot() {
        let mut storage = MemoryStorage::new();
        let state = SimState::new();
        RunSnapshot::capture(&state, &[], 0.0).save(&mut storage);
        assert!(storage.read(keys::RUN_SNAPSHOT).is_some());
        RunSnapshot::clear(&mut storage);
        assert!(storage.read(keys::RUN_SNAPSHOT).is_none());
    }
}
