//! Motion-control components for the differential-drive robot.
//!
//! - `safety`: obstacle veto on intended motion (fail-open on bad sensors)
//! - `distance`: closed-loop per-wheel tick-target driving
//! - `sequencer`: composed autonomous routines on a dedicated task
//! - `dispatcher`: the per-frame operator command state machine

pub mod dispatcher;
pub mod distance;
pub mod safety;
pub mod sequencer;

use serde::{Deserialize, Serialize};

/// A pair of normalized wheel velocities in `[-1.0, 1.0]`.
///
/// Ephemeral: recomputed every control frame, never stored across frames.
///
/// Serialized as JSON with fields `l`/`r`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub l: f32,
    pub r: f32,
}

impl MotionCommand {
    /// Both wheels stopped.
    pub const STOP: MotionCommand = MotionCommand { l: 0.0, r: 0.0 };

    pub const fn new(
        l: f32,
        r: f32,
    ) -> Self {
        MotionCommand { l, r }
    }

    pub fn is_stop(&self) -> bool {
        self.l == 0.0 && self.r == 0.0
    }
}

/// Trim applied to the slower side when driving straight; the left motor runs
/// slightly under the right to compensate for drivetrain asymmetry.
const STRAIGHT_TRIM: (f32, f32) = (0.47, 0.5);
/// Speed pair for an in-place clockwise spin.
const SPIN_TRIM: (f32, f32) = (0.5, -0.47);
/// Encoder ticks for a quarter-turn spin.
const SPIN_TICKS: i32 = 666;
/// Default forward/reverse leg length, in encoder ticks.
pub(crate) const LEG_TICKS: i32 = 2000;

/// One closed-loop point-to-point maneuver: per-wheel signed tick targets and
/// the speed profile to drive while reaching them.
///
/// Tick targets and speeds share sign. Opposite-signed pairs with
/// equal-magnitude targets produce an in-place spin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    pub left_ticks: i32,
    pub right_ticks: i32,
    pub left_speed: f32,
    pub right_speed: f32,
}

impl Maneuver {
    pub const fn new(
        left_ticks: i32,
        right_ticks: i32,
        left_speed: f32,
        right_speed: f32,
    ) -> Self {
        Maneuver {
            left_ticks,
            right_ticks,
            left_speed,
            right_speed,
        }
    }

    /// Drive straight ahead for `ticks` encoder counts.
    pub const fn forward(ticks: i32) -> Self {
        Maneuver::new(ticks, ticks, STRAIGHT_TRIM.0, STRAIGHT_TRIM.1)
    }

    /// Drive straight backward for `ticks` encoder counts.
    pub const fn reverse(ticks: i32) -> Self {
        Maneuver::new(-ticks, -ticks, -STRAIGHT_TRIM.0, -STRAIGHT_TRIM.1)
    }

    /// Spin clockwise in place.
    pub const fn spin_right() -> Self {
        Maneuver::new(SPIN_TICKS, -SPIN_TICKS, SPIN_TRIM.0, SPIN_TRIM.1)
    }

    /// Spin counter-clockwise in place.
    pub const fn spin_left() -> Self {
        Maneuver::new(-SPIN_TICKS, SPIN_TICKS, -SPIN_TRIM.0, -SPIN_TRIM.1)
    }
}

/// Operator input for one control frame.
///
/// The five buttons are rising-edge events (true at most on the frame the
/// press happened); the two stick axes are level inputs in `[-1.0, 1.0]`
/// with the raw forward-is-negative convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorInput {
    pub autonomous_start: bool,
    pub forward: bool,
    pub reverse: bool,
    pub spin_left: bool,
    pub spin_right: bool,
    pub left_axis: f32,
    pub right_axis: f32,
}

/// Fixed autonomous routines the operator can pre-select.
///
/// A closed enumeration: anything the selector does not recognize maps to no
/// selection, and starting autonomous with no selection is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoRoutine {
    /// One straight leg.
    Straight,
    /// Leg, quarter-turn right, leg.
    Dogleg,
    /// Four legs with quarter-turns, returning to the start heading.
    Square,
}

static STRAIGHT: [Maneuver; 1] = [Maneuver::forward(LEG_TICKS)];
static DOGLEG: [Maneuver; 3] = [
    Maneuver::forward(LEG_TICKS),
    Maneuver::spin_right(),
    Maneuver::forward(LEG_TICKS),
];
static SQUARE: [Maneuver; 8] = [
    Maneuver::forward(LEG_TICKS),
    Maneuver::spin_right(),
    Maneuver::forward(LEG_TICKS),
    Maneuver::spin_right(),
    Maneuver::forward(LEG_TICKS),
    Maneuver::spin_right(),
    Maneuver::forward(LEG_TICKS),
    Maneuver::spin_right(),
];

impl AutoRoutine {
    /// The routine's primitives, executed strictly in order.
    pub fn steps(&self) -> &'static [Maneuver] {
        match self {
            AutoRoutine::Straight => &STRAIGHT,
            AutoRoutine::Dogleg => &DOGLEG,
            AutoRoutine::Square => &SQUARE,
        }
    }

    /// Resolve an operator-facing label. Unknown labels mean "no selection".
    pub fn from_label(label: &str) -> Option<AutoRoutine> {
        match label {
            "straight" => Some(AutoRoutine::Straight),
            "dogleg" => Some(AutoRoutine::Dogleg),
            "square" => Some(AutoRoutine::Square),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_shares_sign_across_axes() {
        let m = Maneuver::forward(1500);
        assert!(m.left_ticks > 0 && m.right_ticks > 0);
        assert!(m.left_speed > 0.0 && m.right_speed > 0.0);
        let b = Maneuver::reverse(1500);
        assert!(b.left_ticks < 0 && b.right_ticks < 0);
        assert!(b.left_speed < 0.0 && b.right_speed < 0.0);
    }

    #[test]
    fn spins_drive_wheels_in_opposite_directions() {
        for m in [Maneuver::spin_right(), Maneuver::spin_left()] {
            assert_eq!(m.left_ticks, -m.right_ticks);
            assert!(m.left_speed * m.right_speed < 0.0);
            // each wheel's target and speed agree in sign
            assert!((m.left_ticks as f32) * m.left_speed > 0.0);
            assert!((m.right_ticks as f32) * m.right_speed > 0.0);
        }
    }

    #[test]
    fn routine_labels_resolve_and_fall_back() {
        assert_eq!(AutoRoutine::from_label("dogleg"), Some(AutoRoutine::Dogleg));
        assert_eq!(AutoRoutine::from_label("figure-eight"), None);
        assert_eq!(AutoRoutine::Dogleg.steps().len(), 3);
        assert_eq!(AutoRoutine::Straight.steps().len(), 1);
    }
}
