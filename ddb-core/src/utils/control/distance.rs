//! Closed-loop distance driving against per-wheel encoder targets.
//!
//! A [`DistanceDriver`] holds at most one armed maneuver: a pair of signed
//! tick targets plus the speed profile to drive while reaching them. Arming
//! resets both encoders to establish the maneuver's origin; from then on
//! [`DistanceDriver::step`] is called once per poll, reads the accumulated
//! counts, and commands the motors accordingly. `step` is O(1) and never
//! suspends, so the periodic control frame may call it directly; the
//! sequencer task polls it in a loop instead.
//!
//! The zero target `(0, 0)` is the sentinel for "nothing armed"; it is
//! restored exactly once, when both axes have reached their magnitudes.

use serde::{Deserialize, Serialize};

use crate::utils::control::{Maneuver, MotionCommand};
use crate::utils::drivetrain::{DriveOutput, Encoders, Wheel};

/// Speed factor for a wheel still short of its target after the other wheel
/// has arrived: it creeps the rest of the way instead of overshooting the
/// side that already stopped.
pub const CREEP_FACTOR: f32 = 0.2;

/// Consecutive polls without tick progress on any driven wheel before the
/// maneuver is declared stalled. Polls arrive every control frame (~20 ms),
/// so the default budget is roughly one second.
pub const STALL_STEP_BUDGET: u16 = 50;

/// Progress of an armed maneuver after one `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Still short of at least one target; motors commanded.
    Running,
    /// Both targets reached; motors stopped and the target cleared.
    Done,
    /// No encoder progress within the watchdog budget; motors stopped and
    /// the target cleared so the maneuver cannot spin forever.
    Stalled,
}

#[derive(Debug, Clone, Copy, Default)]
struct Watchdog {
    last: (i32, i32),
    idle_steps: u16,
}

impl Watchdog {
    fn rearm(&mut self) {
        self.last = (0, 0);
        self.idle_steps = 0;
    }

    /// Record one poll's counts; true once the budget is exhausted with no
    /// movement on either wheel.
    fn expired(
        &mut self,
        left: i32,
        right: i32,
    ) -> bool {
        if (left, right) == self.last {
            self.idle_steps += 1;
        } else {
            self.last = (left, right);
            self.idle_steps = 0;
        }
        self.idle_steps >= STALL_STEP_BUDGET
    }
}

/// The closed-loop distance-driving primitive.
///
/// Owns the armed target and its motor profile; both live exactly as long as
/// the maneuver and are zeroed together on completion.
#[derive(Debug, Default)]
pub struct DistanceDriver {
    target: (i32, i32),
    profile: MotionCommand,
    watchdog: Watchdog,
}

impl DistanceDriver {
    pub const fn new() -> Self {
        DistanceDriver {
            target: (0, 0),
            profile: MotionCommand::STOP,
            watchdog: Watchdog {
                last: (0, 0),
                idle_steps: 0,
            },
        }
    }

    /// Whether a maneuver is currently in progress.
    pub fn is_armed(&self) -> bool {
        self.target != (0, 0)
    }

    /// Arm a new maneuver, superseding any in-progress one.
    ///
    /// Resets both encoders so counts accumulate from this maneuver's origin
    /// (the only place counters are ever reset), and immediately commands the
    /// full profile.
    pub fn arm<C>(
        &mut self,
        chassis: &mut C,
        maneuver: Maneuver,
    ) -> Result<(), C::Error>
    where
        C: DriveOutput + Encoders,
    {
        tracing::info!("arming maneuver {:?}", maneuver);
        self.target = (maneuver.left_ticks, maneuver.right_ticks);
        self.profile = MotionCommand::new(maneuver.left_speed, maneuver.right_speed);
        self.watchdog.rearm();
        chassis.reset_both();
        chassis.set_outputs(self.profile.l, self.profile.r)
    }

    /// Advance the armed maneuver by one poll.
    ///
    /// Reads both counts relative to the armed origin and commands:
    /// - the full profile while both axes are short of target,
    /// - zero on a finished wheel and `CREEP_FACTOR ×` profile speed on the
    ///   unfinished one, letting it catch up without overshooting the side
    ///   that already arrived,
    /// - a full stop once both axes have reached their magnitudes, clearing
    ///   the target and returning `Done`.
    ///
    /// Calling with nothing armed returns `Done` without touching the motors.
    pub fn step<C>(
        &mut self,
        chassis: &mut C,
    ) -> Result<StepStatus, C::Error>
    where
        C: DriveOutput + Encoders,
    {
        if !self.is_armed() {
            return Ok(StepStatus::Done);
        }

        let left = chassis.ticks(Wheel::Left);
        let right = chassis.ticks(Wheel::Right);
        let left_done = left.unsigned_abs() >= self.target.0.unsigned_abs();
        let right_done = right.unsigned_abs() >= self.target.1.unsigned_abs();

        if left_done && right_done {
            chassis.stop()?;
            self.disarm();
            tracing::info!("maneuver complete at {}/{} ticks", left, right);
            return Ok(StepStatus::Done);
        }

        if self.watchdog.expired(left, right) {
            chassis.stop()?;
            self.disarm();
            tracing::warn!("maneuver stalled at {}/{} ticks, stopping", left, right);
            return Ok(StepStatus::Stalled);
        }

        if left_done {
            chassis.set_outputs(0.0, creep(self.profile.r))?;
        } else if right_done {
            chassis.set_outputs(creep(self.profile.l), 0.0)?;
        } else {
            chassis.set_outputs(self.profile.l, self.profile.r)?;
        }
        Ok(StepStatus::Running)
    }

    /// Drop any armed target without touching the motors.
    ///
    /// Called internally on completion and stall, and by the dispatcher when
    /// the chassis is handed to the sequencer task: a target armed against a
    /// pre-handoff encoder origin must not survive into the frames after the
    /// sequence ends.
    pub fn disarm(&mut self) {
        self.target = (0, 0);
        self.profile = MotionCommand::STOP;
    }
}

// sign-preserving, so the wheel keeps its commanded direction
fn creep(speed: f32) -> f32 {
    speed * CREEP_FACTOR
}
