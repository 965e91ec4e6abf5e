pub use crate::pipeline::{PipelineConfig, SurveyPipeline, SurveyProduct};
pub use crate::processing::{
    AlignedSample, CorrelationMethod, CorrelationSeries, MapAssembler, MatchedFilter,
    MinSeparation, Peak, PeakExtractor, PowerCalibration, SurveyMap, TimeAligner,
};
pub use crate::survey::{GpsSample, GpsTrack, SurveyCapture, Waveform};

/// Failure conditions surfaced by every stage of the survey pipeline.
///
/// Each variant carries a detail string naming the offending parameter or
/// input so the calling layer can report it without further context.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("no peaks found: {0}")]
    NoPeaksFound(String),
    #[error(
        "echo and GPS windows do not overlap: peaks [{peak_start}, {peak_end}] s, \
         gps [{gps_start}, {gps_end}] s"
    )]
    NoOverlap {
        peak_start: f64,
        peak_end: f64,
        gps_start: f64,
        gps_end: f64,
    },
    #[error("overlap [{start}, {end}] s cannot hold two ticks at time_step {time_step} s")]
    InsufficientOverlap { start: f64, end: f64, time_step: f64 },
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Rejects anything that is not a finite, strictly positive value.
pub(crate) fn require_positive(name: &str, value: f64) -> CoreResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CoreError::InvalidConfiguration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}
