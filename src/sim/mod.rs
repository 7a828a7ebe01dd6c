//! Deterministic simulation module
//!
//! All depth/run logic lives here. This module must be pure and deterministic:
//! - Elapsed time and timestamps are injected, never read ambiently
//! - Input is a single drained delta per tick
//! - No rendering or platform dependencies

pub mod milestones;
pub mod physics;
pub mod state;
pub mod stats;
pub mod tick;

pub use milestones::{Milestones, Split};
pub use physics::{StepOutcome, step};
pub use state::{RunPhase, SimState, TickEvent};
pub use stats::RunStats;
pub use tick::{TickInput, tick};
