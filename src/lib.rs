//! Deepscroll - an endless scroll-driven depth simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, stats, milestones, run state)
//! - `calibration`: Raw-unit to physical-length conversion
//! - `achievements`: Permanent cross-run distance unlocks
//! - `session`: Run lifecycle orchestration and snapshotting
//! - `persistence`: String key/value storage port
//! - `settings`: Persisted preferences (inertia, reduced motion)

pub mod achievements;
pub mod best_depth;
pub mod calibration;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;

pub use achievements::{AchievementDef, Achievements, ConfigError};
pub use calibration::Calibration;
pub use session::Session;
pub use settings::Settings;

/// Simulation tuning constants
pub mod consts {
    /// Minimum integration step; faster frames are clamped up to this
    pub const MIN_DT: f32 = 1.0 / 120.0;
    /// Step used when no previous frame timestamp exists
    pub const NOMINAL_DT: f32 = 1.0 / 60.0;
    /// Upper bound on a single frame gap (background tab, debugger pause)
    pub const MAX_DT: f32 = 0.1;

    /// Per-tick velocity decay in inertia mode
    pub const FRICTION: f32 = 0.96;
    /// |velocity| or |input| above this counts as motion
    pub const MOTION_EPSILON: f32 = 0.1;
    /// Motionless duration before gravity starts pulling back to the surface
    pub const IDLE_GRAVITY_DELAY: f32 = 2.0;
    /// Gravity at depth 0 (raw units/second)
    pub const GRAVITY_BASE: f32 = 80.0;
    /// Gravity gained per raw unit of depth (1/second)
    pub const GRAVITY_DEPTH_SCALE: f32 = 0.05;
    /// Gravity ceiling (raw units/second)
    pub const GRAVITY_MAX: f32 = 1200.0;

    /// Minimum wall-clock gap between run snapshot writes
    pub const SNAPSHOT_MIN_INTERVAL_MS: f64 = 500.0;

    /// Distance milestones, in centimetres, ascending
    pub const MILESTONES_CM: [f32; 5] = [100.0, 500.0, 1000.0, 5000.0, 10000.0];

    /// Minimum gap between consecutive achievement thresholds (metres)
    pub const MIN_ACHIEVEMENT_SPACING_M: f32 = 1.0;

    /// Calibration display scale slider range
    pub const CALIBRATION_SCALE_MIN: f32 = 0.5;
    pub const CALIBRATION_SCALE_MAX: f32 = 1.8;

    /// Fallback raw-units-per-centimetre when no probe is available (96 dpi)
    pub const DEFAULT_PX_PER_CM: f32 = 96.0 / 2.54;
}

/// Centimetres to metres, for converting milestone units to achievement units
#[inline]
pub fn cm_to_m(cm: f32) -> f32 {
    cm / 100.0
}
