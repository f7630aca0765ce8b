//! Motion context: the core-1 dispatch loop.

use rig_core::motion::{PhaseController, PhasePlan};

use crate::mailbox::CompletionSender;
use crate::status::SharedMotionStatus;
use crate::stepper::StepDirDriver;
use crate::timebase::MotionTimebase;

/// Runs the scripted experiment forever.
///
/// Every wait in here blocks: the stepping loop until the leg settles, the
/// dwell between legs, and, should the motor ever stall, this function
/// itself. That is the rig's fail-stop posture; there is no watchdog.
pub fn run(stepper: StepDirDriver<'static>, signals: CompletionSender<'static>) -> ! {
    let mut controller = PhaseController::new(
        stepper,
        signals,
        SharedMotionStatus::new(),
        MotionTimebase::new(),
        PhasePlan::baseline(),
    );

    loop {
        let summary = controller.run_phase_pair();
        defmt::info!(
            "motion: pair {} settled at {} steps, dwell {} ms",
            summary.pairs_completed,
            summary.inbound.settled_position,
            summary.pause.as_millis() as u32,
        );
    }
}
