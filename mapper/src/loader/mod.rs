pub mod gps;
pub mod samples;

pub use gps::{load_track, GpsFormat};
pub use samples::{load_waveform, SampleFormat};

use anyhow::Context;
use reflectcore::survey::SurveyCapture;

use crate::workflow::config::SurveyConfig;

/// Loads the chirp, receive capture and GPS log named in `config`.
pub fn load_capture(config: &SurveyConfig) -> anyhow::Result<SurveyCapture> {
    let files = config
        .files
        .as_ref()
        .context("survey config has no files section; pass --offline for a synthetic survey")?;
    let sample_rate = config.acquisition.sample_rate;

    let transmitted = load_waveform(&files.orig_chirp, files.sample_format, sample_rate)
        .context("loading transmitted chirp")?;
    let received = load_waveform(&files.rx_samps, files.sample_format, sample_rate)
        .context("loading received samples")?;
    let track = load_track(&files.gps_loc, files.gps_format, files.gps_time_scale)
        .context("loading GPS track")?;

    Ok(SurveyCapture::new(transmitted, received, track))
}
