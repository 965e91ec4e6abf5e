use crate::workflow::config::SurveyConfig;
use anyhow::Context;
use reflectcore::processing::{AlignedSample, Peak, SurveyMap};
use reflectcore::survey::SurveyCapture;
use reflectcore::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use reflectcore::SurveyPipeline;
use std::sync::Arc;

pub struct WorkflowResult {
    pub peaks: Vec<Peak>,
    pub aligned: Vec<AlignedSample>,
    pub map: SurveyMap,
    pub correlation_len: usize,
    pub notes: Vec<String>,
}

/// Runs the survey pipeline over one capture, logging each stage.
pub struct Runner {
    pipeline: SurveyPipeline,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: &SurveyConfig) -> anyhow::Result<Self> {
        let pipeline = SurveyPipeline::new(config.to_pipeline_config())
            .context("configuring survey pipeline")?;
        Ok(Self {
            pipeline,
            logger: LogManager::for_target("mapper::runner"),
            metrics: Arc::new(MetricsRecorder::new()),
        })
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn execute(&self, capture: &SurveyCapture) -> anyhow::Result<WorkflowResult> {
        let result = self.run_stages(capture);
        match &result {
            Ok(result) => self
                .metrics
                .record_run(result.peaks.len(), result.aligned.len()),
            Err(err) => {
                self.metrics.record_failure();
                self.logger.warn(&format!("survey run failed: {:#}", err));
            }
        }
        result
    }

    fn run_stages(&self, capture: &SurveyCapture) -> anyhow::Result<WorkflowResult> {
        let series = self
            .pipeline
            .correlate(&capture.received, &capture.transmitted)
            .context("executing matched filter")?;
        self.logger.record(&format!(
            "matched filter {} lags over {} rx / {} tx samples",
            series.len(),
            capture.received.len(),
            capture.transmitted.len()
        ));

        let peaks = self
            .pipeline
            .extract_peaks(&series)
            .context("extracting echo peaks")?;
        let min_separation = self.pipeline.extractor().min_separation().samples();
        self.logger.record(&format!(
            "peak extractor kept {} echoes (min_sep {} samples, {} calibration)",
            peaks.len(),
            min_separation,
            self.pipeline.extractor().calibration().name()
        ));

        let aligned = self
            .pipeline
            .align(&peaks, &capture.track)
            .context("aligning echoes with GPS track")?;
        let time_step = self.pipeline.config().time_step;
        if let (Some(first), Some(last)) = (aligned.first(), aligned.last()) {
            self.logger.record(&format!(
                "time aligner produced {} ticks over [{:.3}, {:.3}] s at {} s",
                aligned.len(),
                first.time,
                last.time,
                time_step
            ));
        }

        let map = self
            .pipeline
            .assemble(&aligned)
            .context("assembling reflectivity map")?;

        let mut notes = vec![
            format!("min_sep {} samples", min_separation),
            format!("time_step {} s", time_step),
        ];
        if let Some((low, high)) = map.power_bounds() {
            notes.push(format!("power range [{:.3}, {:.3}]", low, high));
        }

        Ok(WorkflowResult {
            correlation_len: series.len(),
            peaks,
            aligned,
            map,
            notes,
        })
    }
}
