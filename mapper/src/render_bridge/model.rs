use crate::workflow::runner::WorkflowResult;
use reflectcore::processing::{PlanarPoint, VolumetricPoint};
use serde::{Deserialize, Serialize};

/// Latest reflectivity map as served to renderers.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MapModel {
    pub planar: Vec<PlanarPoint>,
    pub volumetric: Vec<VolumetricPoint>,
    pub peak_count: usize,
    pub aligned_count: usize,
    pub power_bounds: Option<(f64, f64)>,
    pub notes: Vec<String>,
}

impl MapModel {
    pub fn from_result(result: &WorkflowResult) -> Self {
        Self {
            planar: result.map.planar.clone(),
            volumetric: result.map.volumetric.clone(),
            peak_count: result.peaks.len(),
            aligned_count: result.aligned.len(),
            power_bounds: result.map.power_bounds(),
            notes: result.notes.clone(),
        }
    }
}
