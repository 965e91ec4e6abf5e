use crate::math::stats::StatsHelper;
use crate::prelude::{CoreError, CoreResult};
use crate::processing::alignment::AlignedSample;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub power: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumetricPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub power: f64,
}

/// Location-tagged power samples ready for a 2D or 3D renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SurveyMap {
    pub planar: Vec<PlanarPoint>,
    pub volumetric: Vec<VolumetricPoint>,
}

impl SurveyMap {
    pub fn len(&self) -> usize {
        self.planar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planar.is_empty()
    }

    /// Rows of `(lon, lat, power)`.
    pub fn planar_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.planar.len(), 3));
        for (mut row, point) in matrix.rows_mut().into_iter().zip(&self.planar) {
            row[0] = point.longitude;
            row[1] = point.latitude;
            row[2] = point.power;
        }
        matrix
    }

    /// Rows of `(lon, lat, alt, power)`.
    pub fn volumetric_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.volumetric.len(), 4));
        for (mut row, point) in matrix.rows_mut().into_iter().zip(&self.volumetric) {
            row[0] = point.longitude;
            row[1] = point.latitude;
            row[2] = point.altitude;
            row[3] = point.power;
        }
        matrix
    }

    /// Power range for colour scaling.
    pub fn power_bounds(&self) -> Option<(f64, f64)> {
        let power: Vec<f64> = self.planar.iter().map(|p| p.power).collect();
        StatsHelper::bounds(&power)
    }
}

/// Reshapes aligned samples into map point sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapAssembler;

impl MapAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, samples: &[AlignedSample]) -> CoreResult<SurveyMap> {
        if samples.is_empty() {
            return Err(CoreError::InvalidInput("no aligned samples to map".into()));
        }
        Ok(SurveyMap {
            planar: samples
                .iter()
                .map(|s| PlanarPoint {
                    longitude: s.longitude,
                    latitude: s.latitude,
                    power: s.power,
                })
                .collect(),
            volumetric: samples
                .iter()
                .map(|s| VolumetricPoint {
                    longitude: s.longitude,
                    latitude: s.latitude,
                    altitude: s.altitude,
                    power: s.power,
                })
                .collect(),
        })
    }
}
