//! One-time distance checkpoints within a run
//!
//! Thresholds are fixed and ascending; each fires at most once per run,
//! recording a split of the run timer at the crossing.

use serde::{Deserialize, Serialize};

/// A recorded milestone crossing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// The threshold crossed (centimetres)
    pub threshold_cm: f32,
    /// Run time when it was crossed (seconds)
    pub elapsed_secs: f64,
}

/// Per-run milestone progress; clears on grounding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Milestones {
    /// Thresholds already recorded this run
    pub passed: Vec<f32>,
    /// Splits in the order they fired (ascending thresholds)
    pub splits: Vec<Split>,
}

impl Milestones {
    /// Record every not-yet-passed threshold at or below `total_cm`.
    ///
    /// A single large jump can cross several thresholds in one tick; all
    /// of them fire, in ascending order, sharing the same elapsed time.
    /// Returns the splits appended this tick.
    pub fn evaluate(&mut self, total_cm: f32, elapsed_secs: f64, thresholds: &[f32]) -> Vec<Split> {
        let mut fired = Vec::new();
        for &threshold_cm in thresholds {
            if threshold_cm <= total_cm && !self.is_passed(threshold_cm) {
                let split = Split {
                    threshold_cm,
                    elapsed_secs,
                };
                self.passed.push(threshold_cm);
                self.splits.push(split);
                fired.push(split);
            }
        }
        fired
    }

    /// Whether a threshold has already fired this run
    pub fn is_passed(&self, threshold_cm: f32) -> bool {
        self.passed.iter().any(|&t| t == threshold_cm)
    }

    /// Clear all progress (run start and grounding)
    pub fn reset(&mut self) {
        self.passed.clear();
        self.splits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MILESTONES_CM;

    #[test]
    fn test_single_crossing_fires_one_split() {
        let mut m = Milestones::default();
        // 90 -> 120 cm crosses only the 100 cm mark
        assert!(m.evaluate(90.0, 1.0, &MILESTONES_CM).is_empty());
        let fired = m.evaluate(120.0, 2.0, &MILESTONES_CM);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].threshold_cm, 100.0);
        assert_eq!(fired[0].elapsed_secs, 2.0);
    }

    #[test]
    fn test_large_jump_fires_all_crossed_in_order() {
        let mut m = Milestones::default();
        m.evaluate(90.0, 1.0, &MILESTONES_CM);
        let fired = m.evaluate(1200.0, 3.0, &MILESTONES_CM);
        let thresholds: Vec<f32> = fired.iter().map(|s| s.threshold_cm).collect();
        assert_eq!(thresholds, vec![100.0, 500.0, 1000.0]);
        assert!(fired.iter().all(|s| s.elapsed_secs == 3.0));
    }

    #[test]
    fn test_append_once_per_run() {
        let mut m = Milestones::default();
        m.evaluate(150.0, 1.0, &MILESTONES_CM);
        let again = m.evaluate(150.0, 2.0, &MILESTONES_CM);
        assert!(again.is_empty());
        assert_eq!(m.splits.len(), 1);
        // Recorded splits are immutable
        assert_eq!(m.splits[0].elapsed_secs, 1.0);
    }

    #[test]
    fn test_reset_allows_refire() {
        let mut m = Milestones::default();
        m.evaluate(150.0, 1.0, &MILESTONES_CM);
        m.reset();
        assert!(m.splits.is_empty());
        let fired = m.evaluate(150.0, 0.5, &MILESTONES_CM);
        assert_eq!(fired.len(), 1);
    }
}
