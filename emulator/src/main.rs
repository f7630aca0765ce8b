mod sim;

use std::env;
use std::process;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rig_core::mailbox::{MAILBOX_DEPTH, SignalConsumer};
use rig_core::motion::{PhaseController, PhasePlan};
use rig_core::report::{self, LogSink};
use rig_core::telemetry::{PowerSensor, TelemetryAggregator, TickInputs};

use sim::{
    EmuInstant, MailboxReceiver, MailboxSender, ScaledTimebase, SharedStatus, SimSensor,
    SimStepper,
};

/// Dwells and the sampling cadence run this many times faster than on the
/// bench so a demo finishes in seconds.
const TIME_SCALE: u32 = 50;
/// Wall time one simulated motor step consumes.
const SIM_STEP_TIME: Duration = Duration::from_micros(40);
/// Bench sampling cadence before scaling.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

struct Options {
    pairs: u32,
    csv: bool,
}

fn main() {
    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: rig-emulator [--pairs <count>] [--csv]");
        process::exit(2);
    });

    run(&options);
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        pairs: 3,
        csv: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pairs" => {
                let value = args.next().ok_or("--pairs needs a count")?;
                options.pairs = value
                    .parse()
                    .map_err(|_| format!("invalid pair count: {value}"))?;
            }
            "--csv" => options.csv = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(options)
}

struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&mut self, line: &str) {
        println!("{line}");
    }
}

fn run(options: &Options) {
    let (sender, receiver) = mpsc::sync_channel(MAILBOX_DEPTH);
    let status = SharedStatus::default();

    // The motion thread stands in for core 1: it owns the motor, blocks
    // through every leg and dwell, and drops its mailbox half when the
    // scripted pairs are done.
    let pairs = options.pairs;
    let motion_status = status.clone();
    let motion = thread::spawn(move || {
        let mut controller = PhaseController::new(
            SimStepper::new(SIM_STEP_TIME),
            MailboxSender::new(sender),
            motion_status,
            ScaledTimebase::new(TIME_SCALE),
            PhasePlan::baseline(),
        );

        for _ in 0..pairs {
            controller.run_phase_pair();
        }
    });

    let mut sensor = SimSensor::new(status.clone());
    let mut mailbox = MailboxReceiver::new(receiver);
    let mut aggregator: TelemetryAggregator<EmuInstant> = TelemetryAggregator::new();
    let mut sink = StdoutSink;

    if !sensor.initialize() {
        eprintln!("{}", report::SENSOR_MISSING_LINE);
        process::exit(1);
    }
    println!("{}", report::SENSOR_READY_LINE);

    loop {
        let reading = sensor.sample();
        if options.csv {
            println!("{}", report::csv_record(&reading));
        } else {
            report::log_reading(&mut sink, &reading);
        }

        // A disconnected mailbox means the motion thread finished and every
        // queued completion has been drained.
        let signal = match mailbox.try_pop() {
            Ok(signal) => signal,
            Err(_) => break,
        };

        let tick = aggregator.observe(TickInputs {
            reading,
            now: EmuInstant::now(),
            signal,
            motor_finished: status.finished(),
            motor_run_time: status.run_time(),
        });

        if tick.finished_event {
            report::log_finished(&mut sink);
        }
        if let Some(summary) = tick.summary {
            report::log_summary(&mut sink, &summary);
        }

        thread::sleep(SAMPLE_INTERVAL / TIME_SCALE);
    }

    if motion.join().is_err() {
        eprintln!("motion thread panicked");
        process::exit(1);
    }
}
