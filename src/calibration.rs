//! Raw-unit to physical-length conversion
//!
//! The factor is raw units (CSS pixels) per centimetre. It comes from a
//! startup DPI probe or from the user visually matching a reference
//! object of known size. It persists independently of any run and is
//! never touched by lifecycle transitions.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::{Storage, keys};

/// Where the current factor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationSource {
    /// Platform DPI probe, approximate
    Auto,
    /// User visually matched a reference object
    User,
}

/// Real-world reference objects for visual calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceObject {
    /// ISO/IEC 7810 ID-1 card width
    CreditCard,
    /// A 5 cm ruler segment
    RulerSegment,
    /// 1 euro coin diameter
    EuroCoin,
}

impl ReferenceObject {
    /// Physical width in centimetres
    pub fn width_cm(&self) -> f32 {
        match self {
            ReferenceObject::CreditCard => 8.56,
            ReferenceObject::RulerSegment => 5.0,
            ReferenceObject::EuroCoin => 2.325,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferenceObject::CreditCard => "Credit card",
            ReferenceObject::RulerSegment => "5 cm ruler",
            ReferenceObject::EuroCoin => "1 euro coin",
        }
    }
}

/// The conversion factor and its provenance
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Calibration {
    px_per_cm: f32,
    source: CalibrationSource,
    /// The auto estimate measured this startup, kept for reset
    #[serde(skip, default = "default_auto_estimate")]
    auto_estimate: f32,
}

fn default_auto_estimate() -> f32 {
    DEFAULT_PX_PER_CM
}

fn valid(factor: f32) -> bool {
    factor.is_finite() && factor > 0.0
}

impl Calibration {
    /// Build from the startup probe result, falling back to the 96 dpi
    /// default when the probe is unusable.
    pub fn from_auto_estimate(probe_px_per_cm: f32) -> Self {
        let auto = if valid(probe_px_per_cm) {
            probe_px_per_cm
        } else {
            log::warn!("Unusable DPI probe ({probe_px_per_cm}), using 96 dpi default");
            DEFAULT_PX_PER_CM
        };
        Self {
            px_per_cm: auto,
            source: CalibrationSource::Auto,
            auto_estimate: auto,
        }
    }

    /// Load the persisted override, if any; otherwise the auto estimate.
    pub fn load(storage: &mut dyn Storage, probe_px_per_cm: f32) -> Self {
        let mut calibration = Self::from_auto_estimate(probe_px_per_cm);
        if let Some(json) = storage.read(keys::CALIBRATION) {
            match serde_json::from_str::<Calibration>(&json) {
                Ok(stored) if valid(stored.px_per_cm) => {
                    calibration.px_per_cm = stored.px_per_cm;
                    calibration.source = stored.source;
                }
                Ok(stored) => {
                    log::warn!("Rejecting stored calibration factor {}", stored.px_per_cm);
                    storage.remove(keys::CALIBRATION);
                }
                Err(err) => {
                    log::warn!("Discarding corrupt calibration: {err}");
                    storage.remove(keys::CALIBRATION);
                }
            }
        }
        calibration
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        if let Ok(json) = serde_json::to_string(self) {
            storage.write(keys::CALIBRATION, &json);
        }
    }

    /// Raw units per centimetre, always positive and finite
    pub fn px_per_cm(&self) -> f32 {
        self.px_per_cm
    }

    pub fn source(&self) -> CalibrationSource {
        self.source
    }

    /// Convert a raw value to centimetres
    pub fn raw_to_cm(&self, raw: f32) -> f32 {
        raw / self.px_per_cm
    }

    /// Convert a raw value to metres
    pub fn raw_to_m(&self, raw: f32) -> f32 {
        self.raw_to_cm(raw) / 100.0
    }

    /// The on-screen width of a reference object at a display scale,
    /// given its base width at scale 1.0.
    pub fn displayed_px(base_px: f32, scale: f32) -> f32 {
        base_px * scale.clamp(CALIBRATION_SCALE_MIN, CALIBRATION_SCALE_MAX)
    }

    /// Confirm a visual match: the displayed size now corresponds to the
    /// reference's known physical size. Replaces any previous factor
    /// exactly; no averaging with prior calibrations. Returns false and
    /// keeps the previous valid factor if the candidate is degenerate.
    pub fn confirm(&mut self, displayed_px: f32, known_cm: f32) -> bool {
        if !valid(displayed_px) || !valid(known_cm) {
            log::warn!("Rejecting calibration: displayed {displayed_px} px / {known_cm} cm");
            return false;
        }
        let factor = displayed_px / known_cm;
        if !valid(factor) {
            log::warn!("Rejecting calibration factor {factor}");
            return false;
        }
        self.px_per_cm = factor;
        self.source = CalibrationSource::User;
        log::info!("Calibrated: {factor:.2} px/cm (user)");
        true
    }

    /// Revert to the auto estimate and drop the persisted override.
    pub fn reset(&mut self, storage: &mut dyn Storage) {
        self.px_per_cm = self.auto_estimate;
        self.source = CalibrationSource::Auto;
        storage.remove(keys::CALIBRATION);
    }
}
