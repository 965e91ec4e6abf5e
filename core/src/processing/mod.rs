pub mod alignment;
pub mod calibration;
pub mod map;
pub mod matched_filter;
pub mod peaks;

pub use alignment::{AlignedSample, TimeAligner};
pub use calibration::{
    CalibrationModel, ImpedanceCalibration, PassthroughCalibration, PowerCalibration,
};
pub use map::{MapAssembler, PlanarPoint, SurveyMap, VolumetricPoint};
pub use matched_filter::{CorrelationMethod, CorrelationSeries, MatchedFilter};
pub use peaks::{MinSeparation, Peak, PeakExtractor};
