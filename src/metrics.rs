//! Per-stage timing histograms for the solve pipeline.
//! Every stage (OCR, match, format) records its elapsed time; summaries
//! report p50/p95/p99 over the most recent samples.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

/// Pipeline stage being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Ocr,
    Match,
    Format,
    Solve,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Ocr => write!(f, "t_ocr_done"),
            Stage::Match => write!(f, "t_match_done"),
            Stage::Format => write!(f, "t_format_done"),
            Stage::Solve => write!(f, "t_solve_done"),
        }
    }
}

/// Measures one stage from creation until `finish`.
pub struct TimingSpan {
    stage: Stage,
    start: Instant,
    registry: Arc<MetricsRegistry>,
}

impl TimingSpan {
    /// Record elapsed microseconds and return them.
    pub fn finish(self) -> f64 {
        let elapsed_us = self.start.elapsed().as_micros() as f64;
        self.registry.record(self.stage, elapsed_us);
        elapsed_us
    }
}

/// Bounded window of recent samples for one stage.
struct Samples {
    window: Vec<f64>,
    capacity: usize,
    next: usize,
    total: usize,
}

impl Samples {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            window: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            total: 0,
        }
    }

    fn push(&mut self, value: f64) {
        if self.window.len() < self.capacity {
            self.window.push(value);
        } else {
            self.window[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;
        self.total += 1;
    }

    fn percentile(&self, p: f64) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let mut sorted = self.window.clone();
        sorted.sort_by(f64::total_cmp);
        let last = sorted.len() - 1;
        let idx = ((p / 100.0) * last as f64).round() as usize;
        sorted[idx.min(last)]
    }
}

pub struct MetricsRegistry {
    stages: Mutex<HashMap<Stage, Samples>>,
    window: usize,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_window(256)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            stages: Mutex::new(HashMap::new()),
            window: window.max(1),
        }
    }

    pub fn record(&self, stage: Stage, value_us: f64) {
        self.stages
            .lock()
            .entry(stage)
            .or_insert_with(|| Samples::with_capacity(self.window))
            .push(value_us);
        tracing::debug!(metric = %stage, value_us, "metric_recorded");
    }

    pub fn span(self: &Arc<Self>, stage: Stage) -> TimingSpan {
        TimingSpan {
            stage,
            start: Instant::now(),
            registry: Arc::clone(self),
        }
    }

    /// Percentile (0–100) in microseconds; 0 for a stage never recorded.
    pub fn percentile(&self, stage: Stage, p: f64) -> f64 {
        self.stages
            .lock()
            .get(&stage)
            .map(|s| s.percentile(p))
            .unwrap_or(0.0)
    }

    pub fn summary(&self) -> HashMap<String, MetricSummary> {
        self.stages
            .lock()
            .iter()
            .map(|(stage, samples)| {
                (
                    stage.to_string(),
                    MetricSummary {
                        p50_us: samples.percentile(50.0),
                        p95_us: samples.percentile(95.0),
                        p99_us: samples.percentile(99.0),
                        count: samples.total,
                    },
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_over_window() {
        let reg = MetricsRegistry::with_window(4);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            reg.record(Stage::Match, v);
        }
        // 10.0 fell out of the window
        assert_eq!(reg.percentile(Stage::Match, 0.0), 20.0);
        assert_eq!(reg.percentile(Stage::Match, 100.0), 50.0);
        assert_eq!(reg.summary()["t_match_done"].count, 5);
    }

    #[test]
    fn unknown_stage_is_zero() {
        let reg = MetricsRegistry::new();
        assert_eq!(reg.percentile(Stage::Ocr, 50.0), 0.0);
        assert!(reg.summary().is_empty());
    }

    #[test]
    fn span_records_on_finish() {
        let reg = Arc::new(MetricsRegistry::new());
        let span = reg.span(Stage::Format);
        span.finish();
        assert_eq!(reg.summary()["t_format_done"].count, 1);
    }
}
