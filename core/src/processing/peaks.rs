use crate::prelude::{CoreError, CoreResult};
use crate::processing::calibration::{ImpedanceCalibration, PowerCalibration};
use crate::processing::matched_filter::CorrelationSeries;
use serde::{Deserialize, Serialize};

/// Minimum distance, in samples, between two reported echoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinSeparation(usize);

impl MinSeparation {
    pub fn new(samples: usize) -> CoreResult<Self> {
        if samples == 0 {
            return Err(CoreError::InvalidConfiguration(
                "min_sep must be at least 1 sample".into(),
            ));
        }
        Ok(Self(samples))
    }

    /// `ceil(sample_rate * pulse_length)` samples.
    pub fn from_pulse(sample_rate: f64, pulse_length: f64) -> CoreResult<Self> {
        let raw = sample_rate * pulse_length;
        if !raw.is_finite() || raw < 1.0 {
            return Err(CoreError::InvalidConfiguration(format!(
                "min_sep from {} Hz and {} s pulse is {} samples, need at least 1",
                sample_rate, pulse_length, raw
            )));
        }
        // products like 1000.0 * 0.02 land a hair above the integer
        let nearest = raw.round();
        let samples = if (raw - nearest).abs() < 1e-9 {
            nearest
        } else {
            raw.ceil()
        };
        Self::new(samples as usize)
    }

    pub fn samples(&self) -> usize {
        self.0
    }
}

/// Detected echo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub lag: i64,
    /// Seconds from the start of the receive capture.
    pub time: f64,
    pub amplitude_db: f64,
    pub power: f64,
}

/// Picks echoes out of a correlation series and calibrates their power.
pub struct PeakExtractor {
    min_separation: MinSeparation,
    calibration: Box<dyn PowerCalibration>,
}

impl PeakExtractor {
    pub fn new(min_separation: MinSeparation, calibration: Box<dyn PowerCalibration>) -> Self {
        Self {
            min_separation,
            calibration,
        }
    }

    /// Extractor using the default 50 ohm impedance calibration.
    pub fn with_impedance(min_separation: MinSeparation, chirp_length: f64) -> CoreResult<Self> {
        let calibration =
            ImpedanceCalibration::new(ImpedanceCalibration::DEFAULT_IMPEDANCE, chirp_length)?;
        Ok(Self::new(min_separation, Box::new(calibration)))
    }

    pub fn min_separation(&self) -> MinSeparation {
        self.min_separation
    }

    pub fn calibration(&self) -> &dyn PowerCalibration {
        self.calibration.as_ref()
    }

    pub fn execute(&self, series: &CorrelationSeries) -> CoreResult<Vec<Peak>> {
        if series.is_empty() {
            return Err(CoreError::InvalidInput("correlation series is empty".into()));
        }

        let power = series.power_db();
        let candidates = local_maxima(power);
        let retained = select_by_distance(&candidates, power, self.min_separation.samples());
        if retained.is_empty() {
            return Err(CoreError::NoPeaksFound(format!(
                "no local maxima in {} correlation samples",
                series.len()
            )));
        }

        Ok(retained
            .into_iter()
            .map(|index| {
                let amplitude_db = power[index];
                Peak {
                    lag: series.lag(index),
                    time: series.time(index),
                    amplitude_db,
                    power: self.calibration.calibrate(amplitude_db),
                }
            })
            .collect())
    }
}

/// Indices of samples higher than both neighbours. A flat top bounded by
/// lower samples reports its midpoint; the two end samples never qualify.
fn local_maxima(values: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    let last = values.len().saturating_sub(1);
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Keeps the strongest candidates so no two survivors are closer than
/// `distance` samples. Equal amplitudes favour the earlier candidate. The
/// survivors come back in index order.
fn select_by_distance(candidates: &[usize], values: &[f64], distance: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        values[candidates[b]]
            .total_cmp(&values[candidates[a]])
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; candidates.len()];
    for &current in &order {
        if !keep[current] {
            continue;
        }
        let position = candidates[current];
        for j in (0..current).rev() {
            if position - candidates[j] >= distance {
                break;
            }
            keep[j] = false;
        }
        for j in current + 1..candidates.len() {
            if candidates[j] - position >= distance {
                break;
            }
            keep[j] = false;
        }
    }

    candidates
        .iter()
        .zip(keep)
        .filter_map(|(&index, kept)| kept.then_some(index))
        .collect()
}
