//! Per-frame operator command dispatch.
//!
//! The dispatcher is the state machine the periodic control frame runs: each
//! tick it looks at the operator input and the armed-maneuver state and takes
//! exactly one action, in fixed priority order:
//!
//! 1. an autonomous routine is in flight — do nothing (the sequencer task
//!    owns the chassis);
//! 2. autonomous-start pressed — drop any armed maneuver and hand the
//!    selected routine back to the caller, which spawns the sequencer task;
//! 3. a maneuver button pressed — arm that primitive with a fresh encoder
//!    origin, superseding anything in progress;
//! 4. nothing armed — joystick teleop through the safety arbiter;
//! 5. something armed — advance it one step.
//!
//! The frame must never block, so every branch here is O(1) and
//! non-suspending; the dispatcher is re-entered once per frame (~20 ms).

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::utils::control::distance::{DistanceDriver, StepStatus};
use crate::utils::control::safety::SafetyArbiter;
use crate::utils::control::sequencer::SequenceFlag;
use crate::utils::control::{AutoRoutine, Maneuver, MotionCommand, OperatorInput};
use crate::utils::drivetrain::{DriveOutput, Encoders, RangeSample};

/// Latest operator input, published by the input producer (gamepad poller on
/// the robot, the script task in the host simulation) and taken by the
/// control frame once per tick. Button edges are consumed with the take;
/// a frame with no fresh input sees neutral input.
pub static OPERATOR_INPUT: Signal<CriticalSectionRawMutex, OperatorInput> = Signal::new();

/// Session-fixed dispatcher settings.
///
/// One explicit struct rather than scattered globals: the safety clearance,
/// the teleop stick gain, and the pre-selected autonomous routine (if any).
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Minimum obstacle clearance in inches.
    pub safe_distance: f32,
    /// Stick-to-wheel gain. Raw sticks are forward-negative, so the gain is
    /// applied with inverted sign.
    pub joystick_gain: f32,
    /// Routine launched by the autonomous-start button; `None` makes the
    /// button a no-op.
    pub routine: Option<AutoRoutine>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            safe_distance: 15.0,
            joystick_gain: 0.5,
            routine: None,
        }
    }
}

/// What the dispatcher did with one control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The sequencer task owns the chassis; the frame stayed hands-off.
    AutonomousInFlight,
    /// Caller should spawn the sequencer task for this routine.
    LaunchAutonomous(AutoRoutine),
    /// A new maneuver was armed with a fresh encoder origin.
    Armed,
    /// An in-progress maneuver advanced by one step.
    Maneuver(StepStatus),
    /// Joystick teleop; the arbitrated command was written to the motors.
    Teleop,
}

/// The per-frame command state machine.
pub struct CommandDispatcher<'a> {
    config: DispatcherConfig,
    arbiter: SafetyArbiter,
    driver: DistanceDriver,
    sequence: &'a SequenceFlag,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(
        config: DispatcherConfig,
        sequence: &'a SequenceFlag,
    ) -> Self {
        let arbiter = SafetyArbiter::new(config.safe_distance);
        CommandDispatcher {
            config,
            arbiter,
            driver: DistanceDriver::new(),
            sequence,
        }
    }

    /// Run one control frame.
    ///
    /// `ranges` is this frame's ultrasonic snapshot; the arbiter applies to
    /// joystick teleop only, never to distance-driven motion.
    pub fn on_control_tick<C>(
        &mut self,
        input: &OperatorInput,
        ranges: RangeSample,
        chassis: &mut C,
    ) -> Result<FrameOutcome, C::Error>
    where
        C: DriveOutput + Encoders,
    {
        if self.sequence.in_flight() {
            return Ok(FrameOutcome::AutonomousInFlight);
        }

        if input.autonomous_start {
            match self.config.routine {
                Some(routine) => {
                    // the sequencer resets the encoders for its own legs, so
                    // any target armed here is measured against an origin that
                    // no longer exists once the sequence ends
                    self.driver.disarm();
                    return Ok(FrameOutcome::LaunchAutonomous(routine));
                }
                None => tracing::info!("autonomous start pressed with no routine selected"),
            }
        }

        if let Some(maneuver) = Self::armed_by(input) {
            self.driver.arm(chassis, maneuver)?;
            return Ok(FrameOutcome::Armed);
        }

        if !self.driver.is_armed() {
            let intended = MotionCommand::new(
                -self.config.joystick_gain * input.left_axis,
                -self.config.joystick_gain * input.right_axis,
            );
            let command = self.arbiter.arbitrate(intended, ranges);
            chassis.set_outputs(command.l, command.r)?;
            return Ok(FrameOutcome::Teleop);
        }

        let status = self.driver.step(chassis)?;
        Ok(FrameOutcome::Maneuver(status))
    }

    fn armed_by(input: &OperatorInput) -> Option<Maneuver> {
        if input.forward {
            Some(Maneuver::forward(super::LEG_TICKS))
        } else if input.reverse {
            Some(Maneuver::reverse(super::LEG_TICKS))
        } else if input.spin_left {
            Some(Maneuver::spin_left())
        } else if input.spin_right {
            Some(Maneuver::spin_right())
        } else {
            None
        }
    }
}
