//! Pluggable diagnostics handle passed into the decode entry points

mod timing;


use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, info};

pub use timing::{PipelineTimings, StepTiming, Timer};

/// Receives step boundaries and free-form notes from the pipeline.
pub trait Diagnostics: Send + Sync {
    fn step_started(&self, name: &str);
    fn step_finished(&self, name: &str, elapsed: Duration);
    fn note(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn step_started(&self, _name: &str) {}
    fn step_finished(&self, _name: &str, _elapsed: Duration) {}
    fn note(&self, _message: &str) {}
}

/// Forwards to `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn step_started(&self, name: &str) {
        debug!(step = name, "Step started");
    }

    fn step_finished(&self, name: &str, elapsed: Duration) {
        info!(step = name, ms = elapsed.as_secs_f64() * 1000.0, "Step finished");
    }

    fn note(&self, message: &str) {
        info!("{message}");
    }
}

/// Records every finished step into `PipelineTimings`.
#[derive(Debug, Default)]
pub struct TimingDiagnostics {
    timings: Mutex<PipelineTimings>,
    notes: Mutex<Vec<String>>,
}

impl TimingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the steps recorded so far.
    pub fn timings(&self) -> PipelineTimings {
        self.timings
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn notes(&self) -> Vec<String> {
        self.notes
            .lock()
            .map(|n| n.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Diagnostics for TimingDiagnostics {
    fn step_started(&self, _name: &str) {}

    fn step_finished(&self, name: &str, elapsed: Duration) {
        let mut timings = self
            .timings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        timings.add_step(name, elapsed);
    }

    fn note(&self, message: &str) {
        let mut notes = self.notes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        notes.push(message.to_string());
    }
}

/// Runs `f` as a named step, reporting its duration to `diagnostics`.
pub fn step<T>(diagnostics: &dyn Diagnostics, name: &str, f: impl FnOnce() -> T) -> T {
    diagnostics.step_started(name);
    let timer = Timer::start(name);
    let value = f();
    let (name, elapsed) = timer.stop();
    diagnostics.step_finished(&name, elapsed);
    value
}
