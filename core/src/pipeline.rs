use crate::prelude::{require_positive, CoreError, CoreResult};
use crate::processing::{
    AlignedSample, CalibrationModel, CorrelationMethod, CorrelationSeries, ImpedanceCalibration,
    MapAssembler, MatchedFilter, MinSeparation, Peak, PeakExtractor, SurveyMap, TimeAligner,
};
use crate::survey::{GpsTrack, SurveyCapture, Waveform};
use serde::{Deserialize, Serialize};

fn default_impedance() -> f64 {
    ImpedanceCalibration::DEFAULT_IMPEDANCE
}

fn default_time_step() -> f64 {
    TimeAligner::DEFAULT_TIME_STEP
}

/// Acquisition and processing parameters for one survey run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Hz
    pub sample_rate: f64,
    /// Seconds; bounds the spacing of distinct echoes.
    pub pulse_length: f64,
    /// Seconds
    pub chirp_length: f64,
    /// Ohms
    #[serde(default = "default_impedance")]
    pub impedance: f64,
    /// Seconds between ticks of the common timebase.
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    #[serde(default)]
    pub correlation: CorrelationMethod,
    #[serde(default)]
    pub calibration: CalibrationModel,
}

impl PipelineConfig {
    pub fn new(sample_rate: f64, pulse_length: f64, chirp_length: f64) -> Self {
        Self {
            sample_rate,
            pulse_length,
            chirp_length,
            impedance: default_impedance(),
            time_step: default_time_step(),
            correlation: CorrelationMethod::default(),
            calibration: CalibrationModel::default(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_positive("sample_rate", self.sample_rate)?;
        require_positive("pulse_length", self.pulse_length)?;
        require_positive("chirp_length", self.chirp_length)?;
        require_positive("impedance", self.impedance)?;
        require_positive("time_step", self.time_step)?;
        MinSeparation::from_pulse(self.sample_rate, self.pulse_length)?;
        Ok(())
    }

    pub fn min_separation(&self) -> CoreResult<MinSeparation> {
        MinSeparation::from_pulse(self.sample_rate, self.pulse_length)
    }
}

/// Everything a successful run hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyProduct {
    pub peaks: Vec<Peak>,
    pub aligned: Vec<AlignedSample>,
    pub map: SurveyMap,
}

/// Matched filter, peak extraction, time alignment and map assembly wired
/// together for one configuration.
pub struct SurveyPipeline {
    config: PipelineConfig,
    filter: MatchedFilter,
    extractor: PeakExtractor,
    aligner: TimeAligner,
    assembler: MapAssembler,
}

impl SurveyPipeline {
    pub fn new(config: PipelineConfig) -> CoreResult<Self> {
        config.validate()?;
        let calibration = config
            .calibration
            .build(config.impedance, config.chirp_length)?;
        let extractor = PeakExtractor::new(config.min_separation()?, calibration);
        let aligner = TimeAligner::new(config.time_step)?;
        Ok(Self {
            filter: MatchedFilter::new(config.correlation),
            extractor,
            aligner,
            assembler: MapAssembler::new(),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extractor(&self) -> &PeakExtractor {
        &self.extractor
    }

    pub fn correlate(
        &self,
        received: &Waveform,
        transmitted: &Waveform,
    ) -> CoreResult<CorrelationSeries> {
        if received.sample_rate() != self.config.sample_rate {
            return Err(CoreError::InvalidInput(format!(
                "capture sampled at {} Hz, configuration expects {} Hz",
                received.sample_rate(),
                self.config.sample_rate
            )));
        }
        self.filter.execute(received, transmitted)
    }

    pub fn extract_peaks(&self, series: &CorrelationSeries) -> CoreResult<Vec<Peak>> {
        self.extractor.execute(series)
    }

    pub fn align(&self, peaks: &[Peak], track: &GpsTrack) -> CoreResult<Vec<AlignedSample>> {
        self.aligner.execute(peaks, track)
    }

    pub fn assemble(&self, aligned: &[AlignedSample]) -> CoreResult<SurveyMap> {
        self.assembler.execute(aligned)
    }

    pub fn run(&self, capture: &SurveyCapture) -> CoreResult<SurveyProduct> {
        let series = self.correlate(&capture.received, &capture.transmitted)?;
        let peaks = self.extract_peaks(&series)?;
        let aligned = self.align(&peaks, &capture.track)?;
        let map = self.assemble(&aligned)?;
        Ok(SurveyProduct {
            peaks,
            aligned,
            map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::PassthroughCalibration;
    use crate::survey::GpsSample;

    const RATE: f64 = 1000.0;

    fn waveform(samples: Vec<f64>) -> Waveform {
        Waveform::new(samples, RATE).unwrap()
    }

    /// `[1, 0, 0, 1]` followed, 50 samples after its start, by a copy at
    /// half amplitude.
    fn two_echo_capture() -> (Waveform, Waveform) {
        let tx = vec![1.0, 0.0, 0.0, 1.0];
        let mut rx = vec![0.0; 54];
        rx[..4].copy_from_slice(&tx);
        for (i, v) in tx.iter().enumerate() {
            rx[50 + i] = 0.5 * v;
        }
        (waveform(tx), waveform(rx))
    }

    fn walking_track(seconds: usize) -> GpsTrack {
        let samples = (0..=seconds)
            .map(|s| {
                GpsSample::new(
                    1_700_000_000.0 + s as f64,
                    44.97 + 0.0001 * s as f64,
                    -93.26 - 0.0002 * s as f64,
                    255.0 + 0.5 * s as f64,
                )
            })
            .collect();
        GpsTrack::new(samples).unwrap()
    }

    /// Chirp echoes every `spacing` samples with slowly varying strength.
    fn echo_train(tx: &[f64], echoes: usize, spacing: usize) -> Vec<f64> {
        let mut rx = vec![0.0; echoes * spacing + tx.len()];
        for echo in 0..echoes {
            let gain = 0.4 + 0.3 * ((echo as f64) * 0.7).sin().abs();
            for (i, v) in tx.iter().enumerate() {
                rx[echo * spacing + i] += gain * v;
            }
        }
        rx
    }

    fn chirp(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / len as f64;
                (std::f64::consts::PI * 12.0 * t * t).sin()
            })
            .collect()
    }

    #[test]
    fn two_echo_scenario_yields_two_ordered_peaks() {
        let (tx, rx) = two_echo_capture();
        let extractor = PeakExtractor::new(
            MinSeparation::new(20).unwrap(),
            Box::new(PassthroughCalibration),
        );
        for method in [
            CorrelationMethod::Auto,
            CorrelationMethod::Direct,
            CorrelationMethod::Fft,
        ] {
            let series = MatchedFilter::new(method).execute(&rx, &tx).unwrap();
            let peaks = extractor.execute(&series).unwrap();

            let lags: Vec<i64> = peaks.iter().map(|p| p.lag).collect();
            assert_eq!(lags, vec![0, 50], "{:?}", method);
            assert!(peaks[0].time < peaks[1].time);
            assert!(peaks[1].amplitude_db < peaks[0].amplitude_db - 5.0);
        }
    }

    #[test]
    fn self_correlation_yields_single_zero_lag_peak() {
        let tx = waveform(chirp(48));
        let series = MatchedFilter::default().execute(&tx, &tx).unwrap();
        let extractor = PeakExtractor::new(
            MinSeparation::new(tx.len()).unwrap(),
            Box::new(PassthroughCalibration),
        );
        let peaks = extractor.execute(&series).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].lag, 0);
        let max = series
            .power_db()
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(peaks[0].amplitude_db, max);
    }

    #[test]
    fn config_validation_names_the_parameter() {
        let mut config = PipelineConfig::new(RATE, 0.02, 0.004);
        config.time_step = 0.0;
        let err = SurveyPipeline::new(config).err().unwrap();
        assert!(err.to_string().contains("time_step"));

        let mut config = PipelineConfig::new(RATE, 0.02, 0.004);
        config.impedance = -50.0;
        assert!(matches!(
            SurveyPipeline::new(config).err().unwrap(),
            CoreError::InvalidConfiguration(_)
        ));

        let config = PipelineConfig::new(RATE, 0.0001, 0.004);
        assert!(matches!(
            SurveyPipeline::new(config).err().unwrap(),
            CoreError::InvalidConfiguration(_)
        ));
    }

    #[test]
    fn config_defaults_apply_when_deserialized() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"sample_rate": 1000.0, "pulse_length": 0.02, "chirp_length": 0.004}"#,
        )
        .unwrap();
        assert_eq!(config.impedance, 50.0);
        assert_eq!(config.time_step, 0.025);
        assert_eq!(config.correlation, CorrelationMethod::Auto);
        assert_eq!(config.calibration, CalibrationModel::Impedance);
    }

    #[test]
    fn full_run_produces_a_map_over_the_overlap() {
        let tx = chirp(16);
        let rx = echo_train(&tx, 40, 250);
        let mut config = PipelineConfig::new(RATE, 0.2, 0.016);
        config.time_step = 0.5;
        let pipeline = SurveyPipeline::new(config).unwrap();
        let capture = SurveyCapture::new(waveform(tx), waveform(rx), walking_track(30));

        let product = pipeline.run(&capture).unwrap();
        assert_eq!(product.peaks.len(), 40);
        let last_peak = product.peaks.last().unwrap().time;
        assert!((last_peak - 9.75).abs() < 1e-9);
        assert_eq!(product.aligned.len(), 20);
        assert_eq!(product.aligned[0].time, 0.0);
        assert_eq!(product.map.len(), product.aligned.len());
        for pair in product.aligned.windows(2) {
            assert!((pair[1].time - pair[0].time - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let tx = chirp(16);
        let rx = echo_train(&tx, 12, 200);
        let mut config = PipelineConfig::new(RATE, 0.15, 0.016);
        config.time_step = 0.1;
        let pipeline = SurveyPipeline::new(config).unwrap();
        let capture = SurveyCapture::new(waveform(tx), waveform(rx), walking_track(5));
        let first = pipeline.run(&capture).unwrap();
        let second = pipeline.run(&capture).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn capture_rate_must_match_configuration() {
        let pipeline = SurveyPipeline::new(PipelineConfig::new(2000.0, 0.02, 0.004)).unwrap();
        let (tx, rx) = two_echo_capture();
        let capture = SurveyCapture::new(tx, rx, walking_track(2));
        assert!(matches!(
            pipeline.run(&capture),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn track_outside_the_capture_fails_with_no_overlap() {
        let (tx, rx) = two_echo_capture();
        let pipeline = SurveyPipeline::new(PipelineConfig::new(RATE, 0.02, 0.004)).unwrap();
        let peaks = pipeline
            .extract_peaks(&pipeline.correlate(&rx, &tx).unwrap())
            .unwrap();
        let shifted: Vec<Peak> = peaks
            .iter()
            .map(|p| Peak {
                time: p.time + 5.0,
                ..*p
            })
            .collect();
        let track = GpsTrack::new(vec![
            GpsSample::new(0.0, 1.0, 1.0, 1.0),
            GpsSample::new(1.0, 2.0, 2.0, 2.0),
        ])
        .unwrap();
        assert!(matches!(
            pipeline.align(&shifted, &track),
            Err(CoreError::NoOverlap { .. })
        ));
    }
}
