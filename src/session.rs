//! Run lifecycle orchestration
//!
//! Owns the simulation state and every persisted collaborator, drives
//! one tick per host frame, and handles the side effects the tick
//! itself stays pure of: snapshot writes at bounded frequency, snapshot
//! deletion on grounding, achievement persistence, the best-depth
//! record, and the startup resume decision.

use crate::achievements::{Achievements, ConfigError};
use crate::best_depth::BestDepth;
use crate::calibration::Calibration;
use crate::consts::*;
use crate::persistence::{RunSnapshot, Storage};
use crate::settings::Settings;
use crate::sim::state::{RunPhase, SimState, TickEvent};
use crate::sim::stats::RunStats;
use crate::sim::tick::{TickInput, tick};
use crate::sim::Milestones;

/// Everything a running instance owns
pub struct Session<S: Storage> {
    storage: S,
    pub state: SimState,
    pub calibration: Calibration,
    pub achievements: Achievements,
    pub settings: Settings,
    pub best: BestDepth,
    pending_resume: Option<RunSnapshot>,
    last_snapshot_ms: Option<f64>,
    last_frame_ms: Option<f64>,
}

impl<S: Storage> Session<S> {
    /// Load all persisted state and check once for a resumable run.
    ///
    /// Fails only on the fatal achievement-table configuration error.
    pub fn new(mut storage: S, probe_px_per_cm: f32) -> Result<Self, ConfigError> {
        let settings = Settings::load(&mut storage);
        let calibration = Calibration::load(&mut storage, probe_px_per_cm);
        let achievements = Achievements::load(&mut storage)?;
        let best = BestDepth::load(&mut storage);

        let pending_resume = match RunSnapshot::load(&mut storage) {
            Some(snapshot) if snapshot.depth > 0.0 => Some(snapshot),
            Some(_) => {
                // A grounded snapshot has nothing to resume
                RunSnapshot::clear(&mut storage);
                None
            }
            None => None,
        };

        Ok(Self {
            storage,
            state: SimState::new(),
            calibration,
            achievements,
            settings,
            best,
            pending_resume,
            last_snapshot_ms: None,
            last_frame_ms: None,
        })
    }

    /// The snapshot found at startup, if the user has not decided yet
    pub fn resumable(&self) -> Option<&RunSnapshot> {
        self.pending_resume.as_ref()
    }

    /// Rehydrate the run from the startup snapshot. The run timer
    /// continues from the snapshot's elapsed time and the idle timer is
    /// primed as just-moved.
    pub fn resume(&mut self, now_ms: f64) {
        let Some(snapshot) = self.pending_resume.take() else {
            return;
        };
        log::info!(
            "Resuming run at depth {:.0} raw, {:.1}s elapsed",
            snapshot.depth,
            snapshot.elapsed_secs
        );

        self.state = SimState {
            phase: RunPhase::Active,
            depth: snapshot.depth,
            velocity: snapshot.velocity,
            started_at: Some(now_ms - snapshot.elapsed_secs * 1000.0),
            elapsed_secs: snapshot.elapsed_secs,
            idle_secs: 0.0,
            stats: RunStats::rehydrate(
                snapshot.total_cm,
                snapshot.max_speed_cms,
                snapshot.max_accel_cms2,
                snapshot.avg_speed_cms,
                snapshot.direction_changes,
            ),
            milestones: Milestones {
                passed: snapshot.passed_milestone_thresholds.clone(),
                splits: snapshot.splits.clone(),
            },
        };
        self.achievements
            .absorb(&snapshot.unlocked_achievement_keys, &mut self.storage);
        self.last_frame_ms = None;
    }

    /// Decline the startup snapshot: delete it and begin grounded.
    pub fn discard_snapshot(&mut self) {
        if self.pending_resume.take().is_some() {
            RunSnapshot::clear(&mut self.storage);
            log::info!("Discarded saved run");
        }
    }

    /// Drive one host frame: derives the tick duration from the frame
    /// timestamp (clamped to [MIN_DT, MAX_DT], nominal on the first
    /// frame) and advances.
    pub fn frame(&mut self, delta: f32, now_ms: f64) -> Vec<TickEvent> {
        let dt = match self.last_frame_ms {
            Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(MIN_DT, MAX_DT),
            None => NOMINAL_DT,
        };
        self.last_frame_ms = Some(now_ms);
        self.advance(delta, now_ms, dt)
    }

    /// Advance one tick with an explicit duration (tests inject time here).
    pub fn advance(&mut self, delta: f32, now_ms: f64, dt: f32) -> Vec<TickEvent> {
        let input = TickInput {
            delta,
            now_ms,
            inertia: self.settings.inertia_enabled,
            px_per_cm: self.calibration.px_per_cm(),
        };
        let mut events = tick(&mut self.state, &input, dt);

        // Starting a fresh run supersedes any undecided startup snapshot
        if events.contains(&TickEvent::RunStarted) && self.pending_resume.is_some() {
            self.discard_snapshot();
        }

        // The grounding tick reports the final distance; otherwise the
        // live aggregate applies.
        let total_cm = events
            .iter()
            .find_map(|e| match e {
                TickEvent::Grounded { total_cm, .. } => Some(*total_cm),
                _ => None,
            })
            .unwrap_or(self.state.stats.total_cm);

        let fresh = self
            .achievements
            .evaluate(crate::cm_to_m(total_cm), &mut self.storage);
        events.extend(fresh.into_iter().map(|def| TickEvent::AchievementUnlocked {
            key: def.key.to_string(),
            label: def.label.to_string(),
        }));

        let grounded_now = events
            .iter()
            .any(|e| matches!(e, TickEvent::Grounded { .. }));
        if grounded_now {
            // A resumed run may ground before this session ever wrote
            self.last_snapshot_ms = None;
            RunSnapshot::clear(&mut self.storage);
        } else if self.state.phase == RunPhase::Active {
            self.best
                .observe(self.calibration.raw_to_cm(self.state.depth), &mut self.storage);

            let due = self
                .last_snapshot_ms
                .map_or(true, |last| now_ms - last >= SNAPSHOT_MIN_INTERVAL_MS);
            if due {
                RunSnapshot::capture(&self.state, self.achievements.unlocked_keys(), now_ms)
                    .save(&mut self.storage);
                self.last_snapshot_ms = Some(now_ms);
            }
        }

        events
    }

    /// Toggle inertia mode and persist the preference
    pub fn set_inertia(&mut self, enabled: bool) {
        self.settings.inertia_enabled = enabled;
        self.settings.save(&mut self.storage);
    }

    pub fn set_reduced_motion(&mut self, enabled: bool) {
        self.settings.reduced_motion = enabled;
        self.settings.save(&mut self.storage);
    }

    /// Confirm a user calibration and persist it on success
    pub fn calibrate(&mut self, displayed_px: f32, known_cm: f32) -> bool {
        if self.calibration.confirm(displayed_px, known_cm) {
            self.calibration.save(&mut self.storage);
            return true;
        }
        false
    }

    /// Revert calibration to the startup auto estimate
    pub fn reset_calibration(&mut self) {
        self.calibration.reset(&mut self.storage);
    }

    /// Current depth in centimetres
    pub fn depth_cm(&self) -> f32 {
        self.calibration.raw_to_cm(self.state.depth)
    }
}
