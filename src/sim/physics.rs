//! Depth/velocity integration for a single tick
//!
//! One scalar degree of freedom. Two input modes:
//! - Inertia: input deltas are impulses into velocity, friction decays it
//! - Direct: velocity mirrors the accumulated input delta exactly
//!
//! After an idle delay with no motion, gravity drags depth back toward
//! the surface at a depth-dependent, capped rate.

use crate::consts::*;

use super::state::SimState;

/// Result of one integration step
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// Net raw-unit depth change this tick (signed, after clamping)
    pub displacement: f32,
    /// Depth was clamped to 0 this tick after being above it
    pub grounded_edge: bool,
}

/// Advance depth and velocity by one tick.
///
/// `delta` is the raw input accumulated since the previous tick,
/// positive = deeper. `dt` is clamped to [`MIN_DT`] so speed derivation
/// downstream never divides by a degenerate interval.
pub fn step(state: &mut SimState, delta: f32, dt: f32, inertia: bool) -> StepOutcome {
    let dt = dt.max(MIN_DT);
    let prev_depth = state.depth;

    // Motion check runs against the pre-update velocity and raw input
    let moving = state.velocity.abs() > MOTION_EPSILON || delta.abs() > MOTION_EPSILON;
    if moving {
        state.idle_secs = 0.0;
    } else {
        state.idle_secs += dt;
    }

    if inertia {
        state.velocity = state.velocity * FRICTION + delta;
        state.depth += state.velocity;
    } else {
        // No decay carried over: velocity is exactly this tick's input
        state.velocity = delta;
        state.depth += delta;
    }

    // Idle-delay gravity acts on depth directly, after displacement
    if state.idle_secs >= IDLE_GRAVITY_DELAY && state.depth > 0.0 {
        let gravity = (GRAVITY_BASE + state.depth * GRAVITY_DEPTH_SCALE).min(GRAVITY_MAX);
        state.depth -= gravity * dt;
    }

    let mut grounded_edge = false;
    if state.depth <= 0.0 {
        state.depth = 0.0;
        state.velocity = 0.0;
        grounded_edge = prev_depth > 0.0;
    }

    StepOutcome {
        displacement: state.depth - prev_depth,
        grounded_edge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::SimState;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_inertia_friction_decay() {
        let mut state = SimState::new();
        state.depth = 10_000.0;
        state.velocity = 50.0;

        let v0 = state.velocity;
        let n = 30;
        for _ in 0..n {
            step(&mut state, 0.0, DT, true);
        }
        let expected = v0 * FRICTION.powi(n);
        assert!(
            (state.velocity - expected).abs() < 1e-3,
            "velocity {} != expected {}",
            state.velocity,
            expected
        );
    }

    #[test]
    fn test_direct_mode_velocity_mirrors_input() {
        let mut state = SimState::new();
        state.depth = 500.0;

        step(&mut state, 37.5, DT, false);
        assert_eq!(state.velocity, 37.5);
        assert_eq!(state.depth, 537.5);

        // Zero input forces velocity to zero, no residual decay
        step(&mut state, 0.0, DT, false);
        assert_eq!(state.velocity, 0.0);
        assert_eq!(state.depth, 537.5);
    }

    #[test]
    fn test_floor_clamp_and_grounded_edge() {
        let mut state = SimState::new();
        state.depth = 5.0;

        let outcome = step(&mut state, -20.0, DT, false);
        assert_eq!(state.depth, 0.0);
        assert_eq!(state.velocity, 0.0);
        assert!(outcome.grounded_edge);

        // Already at the floor: clamp holds but the edge only fires once
        let outcome = step(&mut state, -20.0, DT, false);
        assert_eq!(state.depth, 0.0);
        assert!(!outcome.grounded_edge);
    }

    #[test]
    fn test_gravity_waits_for_idle_delay() {
        let mut state = SimState::new();
        state.depth = 1000.0;

        // Motionless but not yet past the delay: depth holds
        let ticks_short = (IDLE_GRAVITY_DELAY / DT) as u32 - 2;
        for _ in 0..ticks_short {
            step(&mut state, 0.0, DT, true);
        }
        assert_eq!(state.depth, 1000.0);

        // Past the delay: gravity starts pulling back to the surface
        for _ in 0..4 {
            step(&mut state, 0.0, DT, true);
        }
        assert!(state.depth < 1000.0);
    }

    #[test]
    fn test_motion_resets_idle_timer() {
        let mut state = SimState::new();
        state.depth = 1000.0;

        let ticks = (IDLE_GRAVITY_DELAY / DT) as u32 - 1;
        for _ in 0..ticks {
            step(&mut state, 0.0, DT, false);
        }
        // A real input just before the deadline starts the wait over
        step(&mut state, 5.0, DT, false);
        assert_eq!(state.idle_secs, 0.0);

        for _ in 0..ticks {
            step(&mut state, 0.0, DT, false);
        }
        assert_eq!(state.depth, 1005.0, "gravity must not have fired yet");
    }

    #[test]
    fn test_gravity_magnitude_is_capped() {
        let mut state = SimState::new();
        state.depth = 10_000_000.0;
        state.idle_secs = IDLE_GRAVITY_DELAY;

        let before = state.depth;
        step(&mut state, 0.0, DT, true);
        let pulled = before - state.depth;
        assert!(pulled <= GRAVITY_MAX * DT + 1e-3);
    }

    #[test]
    fn test_sub_epsilon_input_does_not_reset_idle() {
        let mut state = SimState::new();
        state.depth = 300.0;
        state.idle_secs = 1.5;

        step(&mut state, MOTION_EPSILON * 0.5, DT, false);
        assert!(state.idle_secs > 1.5);
    }

    #[test]
    fn test_dt_clamped_to_minimum() {
        let mut state = SimState::new();
        state.depth = 100.0;
        state.idle_secs = IDLE_GRAVITY_DELAY;

        let before = state.depth;
        // Degenerate dt behaves as MIN_DT, not as a zero-length step
        step(&mut state, 0.0, 0.0, true);
        let pulled = before - state.depth;
        assert!(pulled > 0.0);
        assert!(pulled <= GRAVITY_MAX * MIN_DT);
    }
}
