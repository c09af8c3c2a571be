//! The telemetry sink offered the engine's clock once per tick.
//!
//! Opaque to the core (spec §6): sampling, plotting and notebook front-ends
//! live outside this crate and implement `Telemetry` themselves.

/// A sink notified of the simulation clock once per tick.
pub trait Telemetry {
    fn on_step(&mut self, clock_s: f64);
}

/// A `Telemetry` that discards every tick. The `Engine` default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn on_step(&mut self, _clock_s: f64) {}
}
