use std::collections::HashMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// Step durations in the order they finished, plus per-name totals.
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
    step_map: HashMap<String, Duration>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        *self.step_map.entry(name.clone()).or_insert(Duration::ZERO) += duration;
        self.steps.push(StepTiming { name, duration });
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Summed duration of every step called `name`.
    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.step_map.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn summary(&self) -> String {
        let total = self.total_duration();
        let mut out = String::new();
        let _ = writeln!(out, "Pipeline Timing Summary:");
        let _ = writeln!(out, "{:-<60}", "");
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                step.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{:<30} {:>12.3}ms ({:>5.1}%)",
                step.name,
                step.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        let _ = writeln!(out, "{:-<60}", "");
        let _ = writeln!(out, "{:<30} {:>12.3}ms", "Total", total.as_secs_f64() * 1000.0);
        out
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}
