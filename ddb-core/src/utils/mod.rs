//! Utility re-exports and helper macros for the differential-drive core.
//!
//! This module re-exports the motion-control components, timing, and the
//! drivetrain trait seam:
//!
//! - `control`: safety arbitration, closed-loop distance driving, maneuver
//!   sequencing, and per-frame command dispatch
//! - `drivetrain`: traits for the externally-owned actuator and encoder feeds
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod control;
pub mod drivetrain;

pub use control::dispatcher::{CommandDispatcher, DispatcherConfig, FrameOutcome, OPERATOR_INPUT};
pub use control::sequencer::SequenceFlag;
pub use control::{AutoRoutine, Maneuver, MotionCommand, OperatorInput};
pub use drivetrain::{DriveOutput, Encoders, RangeSample, Wheel};
pub use embassy_time::*;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
