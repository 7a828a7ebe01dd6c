//! Permanent distance achievements
//!
//! Unlocks are lifetime state: persisted immediately, never reverted,
//! untouched by grounding. The threshold table is validated once at
//! load; a spacing violation aborts startup.

use thiserror::Error;

use crate::consts::MIN_ACHIEVEMENT_SPACING_M;
use crate::persistence::{Storage, keys};

/// One unlockable title
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementDef {
    /// Unique stable key, also the persisted identifier
    pub key: &'static str,
    /// Cumulative run distance that unlocks it (metres)
    pub threshold_m: f32,
    /// Display label
    pub label: &'static str,
}

/// The built-in achievement table, ascending by threshold
pub const ACHIEVEMENTS: [AchievementDef; 9] = [
    AchievementDef { key: "toe_dip", threshold_m: 1.0, label: "Toe Dip" },
    AchievementDef { key: "arm_span", threshold_m: 2.0, label: "Arm Span" },
    AchievementDef { key: "diving_board", threshold_m: 5.0, label: "Diving Board" },
    AchievementDef { key: "deep_end", threshold_m: 10.0, label: "Deep End" },
    AchievementDef { key: "free_diver", threshold_m: 25.0, label: "Free Diver" },
    AchievementDef { key: "submarine", threshold_m: 50.0, label: "Submarine" },
    AchievementDef { key: "blue_whale", threshold_m: 100.0, label: "Blue Whale" },
    AchievementDef { key: "midnight_zone", threshold_m: 500.0, label: "Midnight Zone" },
    AchievementDef { key: "challenger_deep", threshold_m: 1000.0, label: "Challenger Deep" },
];

/// Fatal configuration errors, checked once at load
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("achievement thresholds not ascending: {earlier} m before {later} m")]
    NotAscending { earlier: f32, later: f32 },

    #[error(
        "achievement thresholds {a} m and {b} m closer than minimum spacing {min} m"
    )]
    SpacingTooSmall { a: f32, b: f32, min: f32 },

    #[error("duplicate achievement key: {key}")]
    DuplicateKey { key: &'static str },
}

/// Validate the threshold table: ascending, minimum spacing, unique keys.
pub fn validate(defs: &[AchievementDef]) -> Result<(), ConfigError> {
    for pair in defs.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if b.threshold_m <= a.threshold_m {
            return Err(ConfigError::NotAscending {
                earlier: a.threshold_m,
                later: b.threshold_m,
            });
        }
        if b.threshold_m - a.threshold_m < MIN_ACHIEVEMENT_SPACING_M {
            return Err(ConfigError::SpacingTooSmall {
                a: a.threshold_m,
                b: b.threshold_m,
                min: MIN_ACHIEVEMENT_SPACING_M,
            });
        }
    }
    for (i, def) in defs.iter().enumerate() {
        if defs[..i].iter().any(|d| d.key == def.key) {
            return Err(ConfigError::DuplicateKey { key: def.key });
        }
    }
    Ok(())
}

/// The achievement table plus the monotonically growing unlocked set
#[derive(Debug)]
pub struct Achievements {
    defs: &'static [AchievementDef],
    /// Unlocked keys in unlock order; grows, never shrinks
    unlocked: Vec<String>,
}

impl Achievements {
    /// Validate the built-in table and load the persisted unlocked set.
    pub fn load(storage: &mut dyn Storage) -> Result<Self, ConfigError> {
        Self::load_with(storage, &ACHIEVEMENTS)
    }

    /// Same, with an injected table (tests).
    pub fn load_with(
        storage: &mut dyn Storage,
        defs: &'static [AchievementDef],
    ) -> Result<Self, ConfigError> {
        validate(defs)?;

        let unlocked = match storage.read(keys::ACHIEVEMENTS) {
            Some(json) => match serde_json::from_str::<Vec<String>>(&json) {
                Ok(list) => list
                    .into_iter()
                    .filter(|key| defs.iter().any(|d| d.key == key))
                    .collect(),
                Err(err) => {
                    log::warn!("Discarding corrupt achievement list: {err}");
                    storage.remove(keys::ACHIEVEMENTS);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(Self { defs, unlocked })
    }

    /// Unlock every achievement at or below the given distance that is
    /// not already unlocked. New unlocks are persisted immediately and
    /// returned in ascending threshold order. Idempotent: re-evaluating
    /// the same or a smaller distance is a no-op.
    pub fn evaluate(
        &mut self,
        total_m: f32,
        storage: &mut dyn Storage,
    ) -> Vec<&'static AchievementDef> {
        let mut fresh = Vec::new();
        for def in self.defs {
            if def.threshold_m <= total_m && !self.is_unlocked(def.key) {
                self.unlocked.push(def.key.to_string());
                fresh.push(def);
            }
        }
        if !fresh.is_empty() {
            self.save(storage);
        }
        fresh
    }

    pub fn is_unlocked(&self, key: &str) -> bool {
        self.unlocked.iter().any(|k| k == key)
    }

    /// Unlocked keys in unlock order
    pub fn unlocked_keys(&self) -> &[String] {
        &self.unlocked
    }

    /// Merge keys from a resumed snapshot into the set (no re-notify).
    pub fn absorb(&mut self, keys_from_snapshot: &[String], storage: &mut dyn Storage) {
        let mut changed = false;
        for key in keys_from_snapshot {
            if self.defs.iter().any(|d| d.key == key) && !self.is_unlocked(key) {
                self.unlocked.push(key.clone());
                changed = true;
            }
        }
        if changed {
            self.save(storage);
        }
    }

    fn save(&self, storage: &mut dyn Storage) {
        match serde_json::to_string(&self.unlocked) {
            Ok(json) => storage.write(keys::ACHIEVEMENTS, &json),
            Err(err) => log::warn!("Achievement list serialization failed: {err}"),
        }
    }
}
