use crate::math::fft::FftHelper;
use crate::prelude::{CoreError, CoreResult};
use crate::survey::Waveform;
use serde::{Deserialize, Serialize};

/// Above this many multiply-accumulates `Auto` switches to the FFT path.
const DIRECT_WORK_LIMIT: usize = 1 << 22;

/// How the cross-correlation is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Direct time-domain sum; exact zeros where nothing overlaps.
    Direct,
    /// Zero-padded FFT convolution; round-off in silent lags reads as silence.
    Fft,
    #[default]
    Auto,
}

impl CorrelationMethod {
    fn resolve(self, rx_len: usize, tx_len: usize) -> Self {
        match self {
            CorrelationMethod::Auto => {
                if rx_len.saturating_mul(tx_len) <= DIRECT_WORK_LIMIT {
                    CorrelationMethod::Direct
                } else {
                    CorrelationMethod::Fft
                }
            }
            other => other,
        }
    }
}

/// Matched-filter output: correlation power in dB for every lag of the full
/// overlap, lag `0` meaning the chirp starts at the first received sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationSeries {
    power_db: Vec<f64>,
    first_lag: i64,
    sample_rate: f64,
}

impl CorrelationSeries {
    /// Wraps an already computed dB series whose first element sits at
    /// `first_lag`.
    pub fn from_power_db(
        power_db: Vec<f64>,
        first_lag: i64,
        sample_rate: f64,
    ) -> CoreResult<Self> {
        if power_db.is_empty() {
            return Err(CoreError::InvalidInput("correlation series is empty".into()));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(CoreError::InvalidInput(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        if power_db.iter().any(|v| v.is_nan()) {
            return Err(CoreError::InvalidInput(
                "correlation series contains NaN".into(),
            ));
        }
        Ok(Self {
            power_db,
            first_lag,
            sample_rate,
        })
    }

    pub fn power_db(&self) -> &[f64] {
        &self.power_db
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.power_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power_db.is_empty()
    }

    /// Lag in samples of the element at `index`.
    pub fn lag(&self, index: usize) -> i64 {
        self.first_lag + index as i64
    }

    /// Time offset in seconds of the element at `index`.
    pub fn time(&self, index: usize) -> f64 {
        self.lag(index) as f64 / self.sample_rate
    }

    /// Time offset in microseconds, the unit survey plots use.
    pub fn time_us(&self, index: usize) -> f64 {
        self.lag(index) as f64 * 1e6 / self.sample_rate
    }

    /// Index of the strongest element; earliest on ties.
    pub fn strongest(&self) -> usize {
        self.power_db
            .iter()
            .enumerate()
            .fold(0, |best, (index, &power)| {
                if power > self.power_db[best] {
                    index
                } else {
                    best
                }
            })
    }
}

/// Cross-correlates a receive capture against the transmitted chirp.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchedFilter {
    method: CorrelationMethod,
}

impl MatchedFilter {
    pub fn new(method: CorrelationMethod) -> Self {
        Self { method }
    }

    pub fn execute(
        &self,
        received: &Waveform,
        transmitted: &Waveform,
    ) -> CoreResult<CorrelationSeries> {
        if received.is_empty() || transmitted.is_empty() {
            return Err(CoreError::InvalidInput(
                "matched filter needs non-empty waveforms".into(),
            ));
        }
        if received.sample_rate() != transmitted.sample_rate() {
            return Err(CoreError::InvalidInput(format!(
                "sample rates differ: received {} Hz, transmitted {} Hz",
                received.sample_rate(),
                transmitted.sample_rate()
            )));
        }

        let rx = received.samples();
        let tx = transmitted.samples();
        let correlation = match self.method.resolve(rx.len(), tx.len()) {
            CorrelationMethod::Fft => {
                let reversed: Vec<f64> = tx.iter().rev().copied().collect();
                FftHelper::convolve(rx, &reversed)
            }
            _ => correlate_direct(rx, tx),
        };

        // FFT round-off leaves a floor around |c|max * eps in silent lags
        let strongest = correlation.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let floor = strongest * correlation.len() as f64 * f64::EPSILON;
        let power_db = correlation
            .iter()
            .map(|value| {
                if value.abs() <= floor {
                    f64::NEG_INFINITY
                } else {
                    20.0 * value.abs().log10()
                }
            })
            .collect();
        let first_lag = -(tx.len() as i64 - 1);
        CorrelationSeries::from_power_db(power_db, first_lag, received.sample_rate())
    }
}

/// `out[k] = sum_n rx[n + k - (m - 1)] * tx[n]` for `k` in `0..n + m - 1`.
fn correlate_direct(rx: &[f64], tx: &[f64]) -> Vec<f64> {
    let offset = tx.len() as i64 - 1;
    let output_len = rx.len() + tx.len() - 1;
    (0..output_len)
        .map(|k| {
            let lag = k as i64 - offset;
            tx.iter()
                .enumerate()
                .filter_map(|(n, &t)| {
                    let index = n as i64 + lag;
                    if index >= 0 && (index as usize) < rx.len() {
                        Some(rx[index as usize] * t)
                    } else {
                        None
                    }
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waveform(samples: &[f64]) -> Waveform {
        Waveform::new(samples.to_vec(), 1000.0).unwrap()
    }

    fn chirp(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / len as f64;
                (std::f64::consts::PI * 8.0 * t * t).cos()
            })
            .collect()
    }

    #[test]
    fn output_covers_full_overlap() {
        let filter = MatchedFilter::default();
        let series = filter
            .execute(&waveform(&[1.0, 2.0, 3.0, 4.0, 5.0]), &waveform(&[1.0, 1.0]))
            .unwrap();
        assert_eq!(series.len(), 6);
        assert_eq!(series.lag(0), -1);
        assert_eq!(series.lag(5), 4);
    }

    #[test]
    fn self_correlation_peaks_at_zero_lag() {
        let tx = waveform(&chirp(64));
        let series = MatchedFilter::default().execute(&tx, &tx).unwrap();
        let strongest = series.strongest();
        assert_eq!(series.lag(strongest), 0);
        assert_eq!(series.time(strongest), 0.0);
    }

    #[test]
    fn delayed_echo_lands_on_its_lag() {
        let tx = [1.0, -1.0, 1.0];
        let mut rx = vec![0.0; 20];
        rx[7..10].copy_from_slice(&tx);
        let series = MatchedFilter::new(CorrelationMethod::Direct)
            .execute(&waveform(&rx), &waveform(&tx))
            .unwrap();
        let strongest = series.strongest();
        assert_eq!(series.lag(strongest), 7);
        assert!((series.time_us(strongest) - 7000.0).abs() < 1e-9);
        assert!((series.power_db()[strongest] - 20.0 * 3f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn direct_and_fft_methods_agree_on_strong_lags() {
        let tx = waveform(&chirp(32));
        let mut rx = vec![0.0; 128];
        for (i, v) in chirp(32).iter().enumerate() {
            rx[40 + i] += v;
        }
        let rx = waveform(&rx);
        let direct = MatchedFilter::new(CorrelationMethod::Direct)
            .execute(&rx, &tx)
            .unwrap();
        let fft = MatchedFilter::new(CorrelationMethod::Fft)
            .execute(&rx, &tx)
            .unwrap();
        assert_eq!(direct.len(), fft.len());
        assert_eq!(direct.strongest(), fft.strongest());
        let index = direct.strongest();
        assert!((direct.power_db()[index] - fft.power_db()[index]).abs() < 1e-6);
    }

    #[test]
    fn mismatched_sample_rates_are_rejected() {
        let rx = Waveform::new(vec![1.0, 0.0], 2000.0).unwrap();
        let err = MatchedFilter::default()
            .execute(&rx, &waveform(&[1.0]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn silent_lags_are_negative_infinity() {
        let series = MatchedFilter::new(CorrelationMethod::Direct)
            .execute(&waveform(&[0.0, 0.0, 1.0]), &waveform(&[1.0]))
            .unwrap();
        assert_eq!(series.power_db()[0], f64::NEG_INFINITY);
        assert_eq!(series.power_db()[2], 0.0);
    }

    #[test]
    fn fft_round_off_is_silenced() {
        let tx = [1.0, 0.0, 0.0, 1.0];
        let mut rx = vec![0.0; 54];
        rx[..4].copy_from_slice(&tx);
        let direct = MatchedFilter::new(CorrelationMethod::Direct)
            .execute(&waveform(&rx), &waveform(&tx))
            .unwrap();
        let fft = MatchedFilter::new(CorrelationMethod::Fft)
            .execute(&waveform(&rx), &waveform(&tx))
            .unwrap();
        for (d, f) in direct.power_db().iter().zip(fft.power_db()) {
            if d.is_finite() {
                assert!((d - f).abs() < 1e-9);
            } else {
                assert_eq!(*f, f64::NEG_INFINITY);
            }
        }
    }

    #[test]
    fn auto_resolves_by_workload() {
        assert_eq!(
            CorrelationMethod::Auto.resolve(1000, 100),
            CorrelationMethod::Direct
        );
        assert_eq!(
            CorrelationMethod::Auto.resolve(1 << 20, 1 << 10),
            CorrelationMethod::Fft
        );
    }
}
