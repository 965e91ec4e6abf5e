use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters accumulated across survey runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub runs: usize,
    pub failures: usize,
    pub peaks_detected: usize,
    pub samples_aligned: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_run(&self, peaks: usize, aligned: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.runs += 1;
            metrics.peaks_detected += peaks;
            metrics.samples_aligned += aligned;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.runs += 1;
            metrics.failures += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
