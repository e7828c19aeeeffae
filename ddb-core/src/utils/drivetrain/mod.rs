//! Drivetrain trait seam for the differential-drive robot.
//!
//! The motor output, wheel encoders, and ultrasonic rangers are owned by the
//! platform (hardware drivers on the robot, a simulation on the host). The
//! control core only ever sees them through the narrow interfaces defined
//! here:
//!
//! - [`DriveOutput`]: normalized left/right velocity commands and a stop.
//! - [`Encoders`]: cumulative signed tick counts per wheel, resettable.
//! - [`RangeSample`]: one ultrasonic snapshot, sampled once per control frame.
//!
//! A complete chassis is any type implementing both `DriveOutput` and
//! `Encoders`; the control components are generic over that bound so the same
//! code runs against hardware and against test doubles.

use serde::{Deserialize, Serialize};

/// One of the two driven wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wheel {
    Left,
    Right,
}

/// Motor output accepting a pair of normalized velocities.
///
/// Implementors are expected to clamp to `[-1.0, 1.0]`; the control core only
/// ever produces values inside that range.
pub trait DriveOutput {
    type Error: core::fmt::Debug;

    /// Command both wheels. Positive is forward.
    fn set_outputs(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Self::Error>;

    /// Bring both wheels to an immediate stop.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.set_outputs(0.0, 0.0)
    }
}

/// Cumulative wheel-encoder feed.
///
/// Counts are signed and monotonic within a reset epoch. `ticks` takes
/// `&mut self` so that simulated feeds may advance their model when polled.
pub trait Encoders {
    /// Zero the given wheel's count, starting a new epoch.
    fn reset(
        &mut self,
        wheel: Wheel,
    );

    /// Zero both counts. Called when a maneuver is armed to establish its origin.
    fn reset_both(&mut self) {
        self.reset(Wheel::Left);
        self.reset(Wheel::Right);
    }

    /// Current signed count for the given wheel since the last reset.
    fn ticks(
        &mut self,
        wheel: Wheel,
    ) -> i32;
}

/// One ultrasonic ranging snapshot, in inches.
///
/// `None` means the reading was unavailable this frame (sensor missing or
/// misbehaving); the safety arbiter treats that as "no obstacle" rather than
/// refusing to move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeSample {
    pub front: Option<f32>,
    pub rear: Option<f32>,
}

impl RangeSample {
    /// A snapshot with both sensors unavailable.
    pub const NONE: RangeSample = RangeSample {
        front: None,
        rear: None,
    };
}
