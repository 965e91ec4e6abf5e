use crate::prelude::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Real-valued sample sequence captured (or transmitted) at a fixed rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WaveformRecord")]
pub struct Waveform {
    samples: Vec<f64>,
    sample_rate: f64,
}

#[derive(Deserialize)]
struct WaveformRecord {
    samples: Vec<f64>,
    sample_rate: f64,
}

impl TryFrom<WaveformRecord> for Waveform {
    type Error = CoreError;

    fn try_from(record: WaveformRecord) -> CoreResult<Self> {
        Waveform::new(record.samples, record.sample_rate)
    }
}

impl Waveform {
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> CoreResult<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(CoreError::InvalidInput(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if samples.is_empty() {
            return Err(CoreError::InvalidInput("waveform has no samples".into()));
        }
        if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::InvalidInput(format!(
                "waveform sample {} is not finite",
                index
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; construction rejects empty sequences.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Capture duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}
