#![no_std]

// Shared logic for the stepper power rig.
//
// This crate stays portable across the RP2040 firmware and host tooling by
// avoiding the Rust standard library and exposing abstractions the other
// crates can adapt their hardware to.

pub mod clock;
pub mod mailbox;
pub mod motion;
pub mod report;
pub mod telemetry;
