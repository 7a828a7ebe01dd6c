//! Simulation state and core types
//!
//! All state that must be persisted for Continue lives here.

use serde::{Deserialize, Serialize};

use super::milestones::Milestones;
use super::stats::RunStats;

/// Current phase of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// At the surface, no run active, no timer
    Grounded,
    /// Below the surface, run timer counting
    Active,
}

/// Events produced by a single tick, consumed by the presentation layer.
///
/// Emitted as a list rather than callbacks so display pacing is decoupled
/// from the tick rate.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// Depth left the surface from a grounded baseline; run timer started
    RunStarted,
    /// A distance milestone was crossed this run
    MilestoneReached { threshold_cm: f32, elapsed_secs: f64 },
    /// A permanent achievement was unlocked
    AchievementUnlocked { key: String, label: String },
    /// Depth returned to exactly 0; run-scoped state has been cleared
    Grounded { total_cm: f32, elapsed_secs: f64 },
}

/// Complete simulation state, advanced by [`super::tick::tick`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Current phase
    pub phase: RunPhase,
    /// Depth below the surface in raw units, always >= 0
    pub depth: f32,
    /// Velocity in raw units per tick, positive = descending
    pub velocity: f32,
    /// Host timestamp (ms) the current run started, present iff Active
    pub started_at: Option<f64>,
    /// Seconds of run time accumulated since the run started
    pub elapsed_secs: f64,
    /// Seconds since the last tick that counted as motion
    pub idle_secs: f32,
    /// Run-scoped distance/speed aggregates
    pub stats: RunStats,
    /// Run-scoped milestone progress and splits
    pub milestones: Milestones,
}

impl Default for SimState {
    fn default() -> Self {
        Self::new()
    }
}

impl SimState {
    /// Create a grounded state at the surface
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Grounded,
            depth: 0.0,
            velocity: 0.0,
            started_at: None,
            elapsed_secs: 0.0,
            idle_secs: 0.0,
            stats: RunStats::default(),
            milestones: Milestones::default(),
        }
    }

    /// Whether a run is currently active
    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Begin a new run at the given host timestamp.
    ///
    /// Clears every run-scoped aggregate. Lifetime state (achievements,
    /// best depth, calibration) lives outside this struct.
    pub fn start_run(&mut self, now_ms: f64) {
        self.phase = RunPhase::Active;
        self.started_at = Some(now_ms);
        self.elapsed_secs = 0.0;
        self.stats.reset();
        self.milestones.reset();
    }

    /// Return to the surface: clear the timer and all run-scoped state.
    pub fn ground(&mut self) {
        self.phase = RunPhase::Grounded;
        self.depth = 0.0;
        self.velocity = 0.0;
        self.started_at = None;
        self.elapsed_secs = 0.0;
        self.idle_secs = 0.0;
        self.stats.reset();
        self.milestones.reset();
    }
}
