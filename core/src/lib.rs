//! Echo detection and GPS fusion core for airborne radar reflectivity surveys.
//!
//! A run correlates the receive capture against the transmitted chirp,
//! picks echo peaks at least one pulse apart, calibrates their power, and
//! resamples echo power and platform position onto one uniform timebase so
//! the result can be rendered as a 2D or 3D reflectivity map. Every stage is
//! a pure function of its inputs; file handling and presentation live in the
//! adapters that call into this crate.

pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod survey;
pub mod telemetry;

pub use pipeline::{PipelineConfig, SurveyPipeline, SurveyProduct};
pub use prelude::{CoreError, CoreResult};
