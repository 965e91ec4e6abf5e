use crate::prelude::{require_positive, CoreResult};
use serde::{Deserialize, Serialize};

/// Converts a correlation-domain peak amplitude (dB) into the power value
/// carried through alignment and mapping.
pub trait PowerCalibration: Send + Sync {
    fn name(&self) -> &'static str;
    fn calibrate(&self, amplitude_db: f64) -> f64;
}

/// `amplitude_db^2 / (impedance * chirp_length)`.
///
/// The dB amplitude itself is squared, so the result is not a physically
/// normalised power. Use another [`PowerCalibration`] when one is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpedanceCalibration {
    impedance: f64,
    chirp_length: f64,
}

impl ImpedanceCalibration {
    pub const DEFAULT_IMPEDANCE: f64 = 50.0;

    pub fn new(impedance: f64, chirp_length: f64) -> CoreResult<Self> {
        Ok(Self {
            impedance: require_positive("impedance", impedance)?,
            chirp_length: require_positive("chirp_length", chirp_length)?,
        })
    }

    pub fn impedance(&self) -> f64 {
        self.impedance
    }

    pub fn chirp_length(&self) -> f64 {
        self.chirp_length
    }
}

impl PowerCalibration for ImpedanceCalibration {
    fn name(&self) -> &'static str {
        "impedance"
    }

    fn calibrate(&self, amplitude_db: f64) -> f64 {
        amplitude_db * amplitude_db / (self.impedance * self.chirp_length)
    }
}

/// Reports the correlation amplitude unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassthroughCalibration;

impl PowerCalibration for PassthroughCalibration {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn calibrate(&self, amplitude_db: f64) -> f64 {
        amplitude_db
    }
}

/// Calibration model selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationModel {
    #[default]
    Impedance,
    Passthrough,
}

impl CalibrationModel {
    pub fn build(self, impedance: f64, chirp_length: f64) -> CoreResult<Box<dyn PowerCalibration>> {
        match self {
            CalibrationModel::Impedance => {
                Ok(Box::new(ImpedanceCalibration::new(impedance, chirp_length)?))
            }
            CalibrationModel::Passthrough => Ok(Box::new(PassthroughCalibration)),
        }
    }
}
