//! Run-scoped distance and speed aggregates
//!
//! All quantities derived from elapsed time use the actual tick duration,
//! never an assumed frame rate, so they stay frame-rate independent.

use serde::{Deserialize, Serialize};

/// Aggregates for the current run, reset on grounding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Cumulative distance travelled this run (centimetres)
    pub total_cm: f32,
    /// Highest instantaneous speed this run (cm/s)
    pub max_speed_cms: f32,
    /// Highest instantaneous acceleration this run (cm/s²)
    pub max_accel_cms2: f32,
    /// total_cm / elapsed run time; exactly 0 while elapsed is 0
    pub avg_speed_cms: f32,
    /// Number of velocity sign flips (zero crossings ignored)
    pub direction_changes: u32,
    /// Previous tick's raw speed (raw units/s), for acceleration
    #[serde(skip)]
    prev_speed_raw: f32,
    /// Sign of the last nonzero velocity: -1, 0 (none yet), or 1
    #[serde(skip)]
    last_sign: i8,
}

impl RunStats {
    /// Fold one tick into the aggregates.
    ///
    /// `velocity` is raw units/tick, `displacement` the net raw depth
    /// change, `px_per_cm` the calibration factor (validated positive
    /// before it reaches here).
    pub fn update(
        &mut self,
        velocity: f32,
        displacement: f32,
        dt: f32,
        elapsed_secs: f64,
        px_per_cm: f32,
    ) {
        let speed_raw = velocity.abs() / dt;
        let accel_raw = (speed_raw - self.prev_speed_raw).abs() / dt;
        self.prev_speed_raw = speed_raw;

        let speed_cms = speed_raw / px_per_cm;
        let accel_cms2 = accel_raw / px_per_cm;
        self.max_speed_cms = self.max_speed_cms.max(speed_cms);
        self.max_accel_cms2 = self.max_accel_cms2.max(accel_cms2);

        self.total_cm += displacement.abs() / px_per_cm;

        self.avg_speed_cms = if elapsed_secs > 0.0 {
            (self.total_cm as f64 / elapsed_secs) as f32
        } else {
            0.0
        };

        let sign: i8 = if velocity > 0.0 {
            1
        } else if velocity < 0.0 {
            -1
        } else {
            0
        };
        if sign != 0 {
            if self.last_sign != 0 && sign != self.last_sign {
                self.direction_changes += 1;
            }
            self.last_sign = sign;
        }
    }

    /// Zero every aggregate (run start and grounding)
    pub fn reset(&mut self) {
        *self = RunStats::default();
    }

    /// Rebuild aggregates from a persisted snapshot. The previous-tick
    /// speed and sign are transient and restart at rest.
    pub fn rehydrate(
        total_cm: f32,
        max_speed_cms: f32,
        max_accel_cms2: f32,
        avg_speed_cms: f32,
        direction_changes: u32,
    ) -> Self {
        Self {
            total_cm,
            max_speed_cms,
            max_accel_cms2,
            avg_speed_cms,
            direction_changes,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_average_speed_zero_when_no_elapsed() {
        let mut stats = RunStats::default();
        stats.update(10.0, 10.0, DT, 0.0, 1.0);
        assert_eq!(stats.avg_speed_cms, 0.0);
        assert!(stats.avg_speed_cms.is_finite());
    }

    #[test]
    fn test_average_speed_is_total_over_elapsed() {
        let mut stats = RunStats::default();
        // 4 ticks of 30 raw units with factor 2 px/cm -> 15 cm each
        let mut elapsed = 0.0f64;
        for _ in 0..4 {
            elapsed += DT as f64;
            stats.update(30.0, 30.0, DT, elapsed, 2.0);
        }
        let expected = stats.total_cm as f64 / elapsed;
        assert!((stats.avg_speed_cms as f64 - expected).abs() < 1e-4);
    }

    #[test]
    fn test_maxima_are_non_decreasing() {
        let mut stats = RunStats::default();
        stats.update(60.0, 60.0, DT, DT as f64, 1.0);
        let peak_speed = stats.max_speed_cms;
        let peak_accel = stats.max_accel_cms2;

        stats.update(5.0, 5.0, DT, 2.0 * DT as f64, 1.0);
        assert_eq!(stats.max_speed_cms, peak_speed);
        assert!(stats.max_accel_cms2 >= peak_accel);
    }

    #[test]
    fn test_direction_changes_ignore_zero() {
        let mut stats = RunStats::default();
        stats.update(10.0, 10.0, DT, DT as f64, 1.0);
        stats.update(0.0, 0.0, DT, 0.03, 1.0);
        stats.update(10.0, 10.0, DT, 0.05, 1.0);
        assert_eq!(stats.direction_changes, 0, "pausing is not a flip");

        stats.update(-10.0, -10.0, DT, 0.07, 1.0);
        assert_eq!(stats.direction_changes, 1);
        stats.update(0.0, 0.0, DT, 0.08, 1.0);
        stats.update(10.0, 10.0, DT, 0.1, 1.0);
        assert_eq!(stats.direction_changes, 2);
    }

    #[test]
    fn test_distance_accumulates_absolute_displacement() {
        let mut stats = RunStats::default();
        stats.update(20.0, 20.0, DT, DT as f64, 2.0);
        stats.update(-20.0, -20.0, DT, 0.04, 2.0);
        assert!((stats.total_cm - 20.0).abs() < 1e-5);
    }
}
