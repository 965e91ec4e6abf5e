use anyhow::Context;
use reflectcore::processing::{CalibrationModel, CorrelationMethod};
use reflectcore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::{GpsFormat, SampleFormat};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionSection {
    pub sample_rate: f64,
    pub pulse_length: f64,
    pub chirp_length: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSection {
    pub impedance: f64,
    pub model: CalibrationModel,
}

impl Default for CalibrationSection {
    fn default() -> Self {
        Self {
            impedance: 50.0,
            model: CalibrationModel::Impedance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentSection {
    pub time_step: f64,
}

impl Default for AlignmentSection {
    fn default() -> Self {
        Self { time_step: 0.025 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationSection {
    pub method: CorrelationMethod,
}

fn default_gps_time_scale() -> f64 {
    1e-6
}

/// Capture files written by the radio and the GPS logger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilesSection {
    pub rx_samps: PathBuf,
    pub orig_chirp: PathBuf,
    pub gps_loc: PathBuf,
    #[serde(default)]
    pub sample_format: SampleFormat,
    #[serde(default)]
    pub gps_format: GpsFormat,
    /// Multiplier taking column-format GPS stamps to seconds.
    #[serde(default = "default_gps_time_scale")]
    pub gps_time_scale: f64,
}

impl FilesSection {
    /// Resolves relative paths against `base`.
    fn rebased(mut self, base: &Path) -> Self {
        for path in [&mut self.rx_samps, &mut self.orig_chirp, &mut self.gps_loc] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub acquisition: AcquisitionSection,
    #[serde(default)]
    pub calibration: CalibrationSection,
    #[serde(default)]
    pub alignment: AlignmentSection,
    #[serde(default)]
    pub correlation: CorrelationSection,
    #[serde(default)]
    pub files: Option<FilesSection>,
}

impl Default for SurveyConfig {
    /// Matches the synthetic survey the generator builds by default.
    fn default() -> Self {
        Self {
            acquisition: AcquisitionSection {
                sample_rate: 20_000.0,
                pulse_length: 0.05,
                chirp_length: 0.0025,
            },
            calibration: CalibrationSection::default(),
            alignment: AlignmentSection::default(),
            correlation: CorrelationSection::default(),
            files: None,
        }
    }
}

impl SurveyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading survey config {}", path_ref.display()))?;
        let mut config: SurveyConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing survey config {}", path_ref.display()))?;
        if let Some(base) = path_ref.parent() {
            config.files = config.files.map(|files| files.rebased(base));
        }
        Ok(config)
    }

    pub fn apply_overrides(&mut self, time_step: Option<f64>, impedance: Option<f64>) {
        if let Some(time_step) = time_step {
            self.alignment.time_step = time_step;
        }
        if let Some(impedance) = impedance {
            self.calibration.impedance = impedance;
        }
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            sample_rate: self.acquisition.sample_rate,
            pulse_length: self.acquisition.pulse_length,
            chirp_length: self.acquisition.chirp_length,
            impedance: self.calibration.impedance,
            time_step: self.alignment.time_step,
            correlation: self.correlation.method,
            calibration: self.calibration.model,
        }
    }
}
