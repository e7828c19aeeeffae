use clap::Parser;
use ddb_core::mk_static;
use ddb_core::utils::control::sequencer;
use ddb_core::utils::{
    AutoRoutine, CommandDispatcher, DispatcherConfig, DriveOutput, Encoders, FrameOutcome,
    OperatorInput, RangeSample, SequenceFlag, Wheel, OPERATOR_INPUT,
};
use embassy_executor::{Executor, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use static_cell::StaticCell;
use tracing::{error, info, warn};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// Minimum obstacle clearance in inches
    #[clap(long, default_value_t = 15.0)]
    safe_distance: f32,
    /// Autonomous routine label: straight, dogleg or square
    #[clap(long, default_value = "dogleg")]
    routine: String,
    /// Place a simulated obstacle this many inches ahead
    #[clap(long)]
    obstacle: Option<f32>,
    /// Operator script as a JSON array of per-frame inputs
    #[clap(long)]
    script: Option<String>,
    /// How many control frames to simulate before exiting
    #[clap(long, default_value_t = 2000)]
    frames: u32,
}

/// At full output, how many encoder ticks one wheel accumulates per read.
const TICKS_PER_READ: f32 = 120.0;

/// Simulated chassis: encoder counts integrate the last commanded outputs on
/// every read, and every change of actuator command is logged.
struct SimChassis {
    command: (f32, f32),
    counts: (f32, f32),
}

impl SimChassis {
    fn new() -> Self {
        SimChassis {
            command: (0.0, 0.0),
            counts: (0.0, 0.0),
        }
    }
}

impl DriveOutput for SimChassis {
    type Error = core::convert::Infallible;

    fn set_outputs(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Self::Error> {
        let left = left.clamp(-1.0, 1.0);
        let right = right.clamp(-1.0, 1.0);
        if (left, right) != self.command {
            info!("motors: left={:.2} right={:.2}", left, right);
        }
        self.command = (left, right);
        Ok(())
    }
}

impl Encoders for SimChassis {
    fn reset(
        &mut self,
        wheel: Wheel,
    ) {
        match wheel {
            Wheel::Left => self.counts.0 = 0.0,
            Wheel::Right => self.counts.1 = 0.0,
        }
    }

    fn ticks(
        &mut self,
        wheel: Wheel,
    ) -> i32 {
        match wheel {
            Wheel::Left => {
                self.counts.0 += self.command.0 * TICKS_PER_READ;
                self.counts.0 as i32
            }
            Wheel::Right => {
                self.counts.1 += self.command.1 * TICKS_PER_READ;
                self.counts.1 as i32
            }
        }
    }
}

type SharedChassis = Mutex<CriticalSectionRawMutex, SimChassis>;

static SEQUENCE: SequenceFlag = SequenceFlag::new();

#[embassy_executor::task]
async fn autonomous_task(
    chassis: &'static SharedChassis,
    routine: AutoRoutine,
) {
    info!("autonomous routine {:?} started", routine);
    match sequencer::run(chassis, &SEQUENCE, routine.steps()).await {
        Ok(()) => info!("autonomous routine {:?} complete", routine),
        Err(e) => warn!("autonomous routine {:?} aborted: {:?}", routine, e),
    }
}

#[embassy_executor::task]
async fn control_frame_task(
    spawner: Spawner,
    chassis: &'static SharedChassis,
    config: DispatcherConfig,
    obstacle: Option<f32>,
    frames: u32,
) {
    let mut dispatcher = CommandDispatcher::new(config, &SEQUENCE);
    let ranges = RangeSample {
        front: obstacle,
        rear: None,
    };

    for _ in 0..frames {
        Timer::after(sequencer::FRAME_PERIOD).await;
        let input = OPERATOR_INPUT.try_take().unwrap_or_default();

        // the sequencer task holds the chassis for the whole of a routine;
        // a frame that cannot take it skips without blocking
        let Ok(mut guard) = chassis.try_lock() else {
            continue;
        };
        match dispatcher.on_control_tick(&input, ranges, &mut *guard) {
            Ok(FrameOutcome::LaunchAutonomous(routine)) => {
                drop(guard);
                if let Err(e) = spawner.spawn(autonomous_task(chassis, routine)) {
                    warn!("could not spawn autonomous task: {:?}", e);
                }
            }
            Ok(FrameOutcome::Armed) => info!("maneuver armed"),
            Ok(_) => {}
            Err(e) => error!("control frame failed: {:?}", e),
        }
    }
    info!("simulation finished after {} frames", frames);
    std::process::exit(0);
}

#[embassy_executor::task]
async fn operator_task(script: Vec<OperatorInput>) {
    for input in script {
        OPERATOR_INPUT.signal(input);
        // two frame periods per entry so the control frame is guaranteed to
        // take every entry before the next one lands in the signal
        Timer::after(sequencer::FRAME_PERIOD * 2).await;
    }
    info!("operator script exhausted");
}

/// Built-in demonstration script: a stretch of stick driving, one
/// encoder-distance button maneuver, then an autonomous start.
fn default_script() -> Vec<OperatorInput> {
    let mut script = Vec::new();
    for _ in 0..25 {
        script.push(OperatorInput {
            left_axis: -0.8,
            right_axis: -0.8,
            ..OperatorInput::default()
        });
    }
    script.push(OperatorInput {
        forward: true,
        ..OperatorInput::default()
    });
    for _ in 0..40 {
        script.push(OperatorInput::default());
    }
    script.push(OperatorInput {
        autonomous_start: true,
        ..OperatorInput::default()
    });
    script
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    let routine = AutoRoutine::from_label(&opts.routine);
    if routine.is_none() {
        info!("routine label {:?} not recognized, autonomous start will be a no-op", opts.routine);
    }
    let config = DispatcherConfig {
        safe_distance: opts.safe_distance,
        joystick_gain: 0.5,
        routine,
    };

    let script = match opts.script.as_deref() {
        Some(s) => serde_json::from_str(s).expect("invalid operator script"),
        None => default_script(),
    };

    let chassis: &'static SharedChassis = mk_static!(SharedChassis, Mutex::new(SimChassis::new()));

    spawner
        .spawn(control_frame_task(spawner, chassis, config, opts.obstacle, opts.frames))
        .unwrap();
    spawner.spawn(operator_task(script)).unwrap();
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
