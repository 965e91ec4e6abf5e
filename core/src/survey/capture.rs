use crate::survey::{GpsTrack, Waveform};
use serde::{Deserialize, Serialize};

/// Everything one survey run consumes: the reference chirp, the receive
/// capture and the platform track recorded alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyCapture {
    pub transmitted: Waveform,
    pub received: Waveform,
    pub track: GpsTrack,
}

impl SurveyCapture {
    pub fn new(transmitted: Waveform, received: Waveform, track: GpsTrack) -> Self {
        Self {
            transmitted,
            received,
            track,
        }
    }
}
