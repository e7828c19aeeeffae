//! Autonomous maneuver sequencing on a dedicated task.
//!
//! A routine is an ordered list of [`Maneuver`] primitives; each one runs
//! fully to completion before the next starts, with no rollback. The run
//! executes on its own task so the periodic control frame keeps servicing
//! teleop and safety while autonomous motion is in flight.
//!
//! Two pieces of shared state coordinate the run with the control frame:
//!
//! - the chassis lives behind an `embassy_sync` mutex, and the run holds the
//!   lock for its entire duration. The lock is the single maneuver-owner
//!   token: the frame uses `try_lock` and therefore can never issue an
//!   actuator write that conflicts with the sequencer's.
//! - a [`SequenceFlag`] is raised for exactly the duration of the run, which
//!   the dispatcher reads to refuse arming new maneuvers or accepting
//!   joystick input mid-sequence.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};

use crate::utils::control::distance::{DistanceDriver, StepStatus};
use crate::utils::control::Maneuver;
use crate::utils::drivetrain::{DriveOutput, Encoders};

/// Poll cadence while driving a primitive to completion, matching the
/// periodic control frame.
pub const FRAME_PERIOD: Duration = Duration::from_millis(20);

/// Why a routine ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError<E> {
    /// A primitive made no encoder progress within the watchdog budget.
    Stalled { completed: usize },
    /// The drive output rejected a command.
    Drive(E),
}

impl<E> From<E> for SequenceError<E> {
    fn from(e: E) -> Self {
        SequenceError::Drive(e)
    }
}

/// Shared "autonomous routine in flight" flag.
///
/// Owned by whoever wires the tasks together (a static in the application,
/// a local in tests); the sequencer raises it for the duration of a run and
/// the dispatcher polls it each frame.
#[derive(Debug, Default)]
pub struct SequenceFlag(AtomicBool);

impl SequenceFlag {
    pub const fn new() -> Self {
        SequenceFlag(AtomicBool::new(false))
    }

    pub fn in_flight(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn raise(&self) -> FlightGuard<'_> {
        self.0.store(true, Ordering::Release);
        FlightGuard(&self.0)
    }
}

/// Lowers the flag when the run ends, whichever way it ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Run an ordered routine of primitives, each fully to completion.
///
/// Locks the chassis for the whole run and polls the distance driver every
/// [`FRAME_PERIOD`]. A stall aborts the remainder of the routine; the count
/// of primitives that did complete is reported with the error. The flag is
/// false again immediately after the last primitive completes (or the run
/// aborts).
///
/// There is no mid-flight cancellation; the stall watchdog bounds how long
/// a wedged primitive can hold the chassis.
pub async fn run<C>(
    chassis: &Mutex<CriticalSectionRawMutex, C>,
    flag: &SequenceFlag,
    steps: &[Maneuver],
) -> Result<(), SequenceError<C::Error>>
where
    C: DriveOutput + Encoders,
{
    let mut chassis = chassis.lock().await;
    let _guard = flag.raise();
    let mut driver = DistanceDriver::new();

    tracing::info!("starting autonomous routine, {} primitives", steps.len());
    for (index, maneuver) in steps.iter().enumerate() {
        driver.arm(&mut *chassis, *maneuver)?;
        loop {
            match driver.step(&mut *chassis)? {
                StepStatus::Running => Timer::after(FRAME_PERIOD).await,
                StepStatus::Done => break,
                StepStatus::Stalled => {
                    return Err(SequenceError::Stalled { completed: index });
                }
            }
        }
        tracing::info!("primitive {} of {} complete", index + 1, steps.len());
    }
    Ok(())
}
