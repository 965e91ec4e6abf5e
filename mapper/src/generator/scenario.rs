use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use reflectcore::survey::{GpsSample, GpsTrack, SurveyCapture, Waveform};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::generator::chirp::linear_chirp;
use crate::workflow::config::SurveyConfig;

/// Upper bound on synthetic GPS fixes.
const MAX_FIXES: usize = 1 << 24;

/// Parameters of a synthetic survey flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub sample_rate: f64,
    pub chirp_length: f64,
    /// Pulse repetition interval, seconds.
    pub pulse_length: f64,
    pub pulses: usize,
    pub start_frequency: f64,
    pub bandwidth: f64,
    /// Two-way travel time to the ground, seconds.
    pub echo_delay: f64,
    pub noise: f64,
    pub seed: u64,
    /// Fixes per second.
    pub gps_rate: f64,
    /// Logger clock at the first fix, seconds.
    pub gps_epoch: f64,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub start_altitude: f64,
    /// Degrees per second along each axis.
    pub latitude_rate: f64,
    pub longitude_rate: f64,
    /// Metres per second.
    pub climb_rate: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 20_000.0,
            chirp_length: 0.0025,
            pulse_length: 0.05,
            pulses: 200,
            start_frequency: 1_000.0,
            bandwidth: 4_000.0,
            echo_delay: 0.004,
            noise: 0.02,
            seed: 0,
            gps_rate: 1.0,
            gps_epoch: 1_700_000_000.0,
            start_latitude: 44.9778,
            start_longitude: -93.2650,
            start_altitude: 300.0,
            latitude_rate: 2.0e-5,
            longitude_rate: -3.0e-5,
            climb_rate: 0.5,
        }
    }
}

impl ScenarioConfig {
    /// Scenario sampled the way `config` expects its captures.
    pub fn from_survey(config: &SurveyConfig) -> Self {
        Self {
            sample_rate: config.acquisition.sample_rate,
            chirp_length: config.acquisition.chirp_length,
            pulse_length: config.acquisition.pulse_length,
            ..Default::default()
        }
    }

    fn pulse_samples(&self) -> usize {
        (self.sample_rate * self.pulse_length).round() as usize
    }

    fn duration(&self) -> f64 {
        self.pulses as f64 * self.pulse_length
    }
}

/// Ground reflectivity seen by pulse `index`, between 0.3 and 0.9.
fn reflectivity(index: usize) -> f64 {
    0.3 + 0.6 * (2.0 * PI * index as f64 / 50.0).sin().abs()
}

fn build_received(config: &ScenarioConfig, chirp: &[f64]) -> anyhow::Result<Vec<f64>> {
    let pulse_samples = config.pulse_samples();
    let delay = (config.echo_delay * config.sample_rate).round() as usize;
    if delay + chirp.len() > pulse_samples {
        anyhow::bail!(
            "echo delay {} s plus chirp does not fit in a {} s pulse",
            config.echo_delay,
            config.pulse_length
        );
    }
    let length = config
        .pulses
        .checked_mul(pulse_samples)
        .context("overflow computing receive capture length")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut samples: Vec<f64> = (0..length)
        .map(|_| {
            if config.noise > 0.0 {
                rng.gen_range(-config.noise..config.noise)
            } else {
                0.0
            }
        })
        .collect();

    for pulse in 0..config.pulses {
        let start = pulse * pulse_samples + delay;
        let gain = reflectivity(pulse);
        for (offset, value) in chirp.iter().enumerate() {
            samples[start + offset] += gain * value;
        }
    }
    Ok(samples)
}

fn build_track(config: &ScenarioConfig) -> anyhow::Result<GpsTrack> {
    let intervals = (config.duration() * config.gps_rate).ceil();
    if !intervals.is_finite() || intervals >= MAX_FIXES as f64 {
        anyhow::bail!(
            "gps_rate {} Hz over {} s needs more than {} fixes",
            config.gps_rate,
            config.duration(),
            MAX_FIXES
        );
    }
    let fixes = (intervals as usize)
        .checked_add(1)
        .context("overflow computing GPS fix count")?;
    let samples = (0..fixes)
        .map(|i| {
            let elapsed = i as f64 / config.gps_rate;
            GpsSample::new(
                config.gps_epoch + elapsed,
                config.start_latitude + config.latitude_rate * elapsed,
                config.start_longitude + config.longitude_rate * elapsed,
                config.start_altitude + config.climb_rate * elapsed,
            )
        })
        .collect();
    GpsTrack::new(samples).context("building synthetic GPS track")
}

pub fn build_capture(config: &ScenarioConfig) -> anyhow::Result<SurveyCapture> {
    if config.pulses == 0 || config.pulse_samples() == 0 {
        anyhow::bail!("synthetic survey needs at least one pulse of non-zero length");
    }
    if !config.gps_rate.is_finite() || config.gps_rate <= 0.0 {
        anyhow::bail!("gps_rate must be positive, got {}", config.gps_rate);
    }

    let chirp = linear_chirp(
        config.sample_rate,
        config.chirp_length,
        config.start_frequency,
        config.bandwidth,
    );
    let received = build_received(config, &chirp)?;
    let track = build_track(config)?;

    let transmitted =
        Waveform::new(chirp, config.sample_rate).context("building synthetic chirp")?;
    let received =
        Waveform::new(received, config.sample_rate).context("building synthetic capture")?;
    Ok(SurveyCapture::new(transmitted, received, track))
}
