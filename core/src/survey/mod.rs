pub mod capture;
pub mod track;
pub mod waveform;

pub use capture::SurveyCapture;
pub use track::{GpsSample, GpsTrack};
pub use waveform::Waveform;
