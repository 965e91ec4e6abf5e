pub mod fft;
pub mod interp;
pub mod stats;

pub use fft::FftHelper;
pub use interp::{interpolate, interpolate_all};
pub use stats::StatsHelper;
