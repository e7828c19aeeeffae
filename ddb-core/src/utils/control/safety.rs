//! Obstacle-stop arbitration for intended motion.
//!
//! The arbiter sits between any velocity source and the motor output: it
//! vetoes motion that would close on an obstacle inside the configured
//! clearance, and passes everything else through untouched. It never writes
//! to the actuator itself.

use crate::utils::control::MotionCommand;
use crate::utils::drivetrain::RangeSample;

/// Minimum-clearance veto on intended motion commands.
///
/// The threshold is fixed for a session; observed deployments use 15 or 30
/// inches depending on the venue.
#[derive(Debug, Clone, Copy)]
pub struct SafetyArbiter {
    threshold: f32,
}

impl SafetyArbiter {
    pub const fn new(threshold: f32) -> Self {
        SafetyArbiter { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Veto the intended command if it closes on an obstacle inside the
    /// threshold; otherwise pass it through unchanged.
    ///
    /// A missing reading (`None`) never blocks motion: an unreadable sensor
    /// must not strand the robot, so the check fails open.
    pub fn arbitrate(
        &self,
        intended: MotionCommand,
        ranges: RangeSample,
    ) -> MotionCommand {
        if intended.l > 0.0 && intended.r > 0.0 && self.too_close(ranges.front) {
            tracing::debug!("front obstacle inside {} in, vetoing forward motion", self.threshold);
            return MotionCommand::STOP;
        }
        if intended.l < 0.0 && intended.r < 0.0 && self.too_close(ranges.rear) {
            tracing::debug!("rear obstacle inside {} in, vetoing reverse motion", self.threshold);
            return MotionCommand::STOP;
        }
        intended
    }

    fn too_close(
        &self,
        reading: Option<f32>,
    ) -> bool {
        match reading {
            Some(distance) => distance < self.threshold,
            None => false,
        }
    }
}
