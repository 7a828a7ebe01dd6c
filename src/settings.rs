//! Persisted preferences
//!
//! Stored separately from run snapshots; survives grounding and reloads.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, keys};

/// User preferences
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settings {
    /// Inertia mode: deltas become impulses with friction decay.
    /// Off = depth follows the input directly.
    pub inertia_enabled: bool,
    /// Minimize presentation-layer motion (consumed by the display side)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inertia_enabled: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    pub fn load(storage: &mut dyn Storage) -> Self {
        if let Some(json) = storage.read(keys::SETTINGS) {
            match serde_json::from_str(&json) {
                Ok(settings) => return settings,
                Err(err) => {
                    log::warn!("Discarding corrupt settings: {err}");
                    storage.remove(keys::SETTINGS);
                }
            }
        }
        Self::default()
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        if let Ok(json) = serde_json::to_string(self) {
            storage.write(keys::SETTINGS, &json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_defaults_when_absent_or_corrupt() {
        let mut storage = MemoryStorage::new();
        assert!(Settings::load(&mut storage).inertia_enabled);

        storage.write(keys::SETTINGS, "nope");
        let settings = Settings::load(&mut storage);
        assert!(settings.inertia_enabled);
        assert!(!settings.reduced_motion);
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let settings = Settings {
            inertia_enabled: false,
            reduced_motion: true,
        };
        settings.save(&mut storage);
        let loaded = Settings::load(&mut storage);
        assert!(!loaded.inertia_enabled);
        assert!(loaded.reduced_motion);
    }
}
