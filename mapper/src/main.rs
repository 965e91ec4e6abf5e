use anyhow::Context;
use clap::Parser;
use generator::scenario::{build_capture, ScenarioConfig};
use log::info;
use render_bridge::bridge::{default_bind_address, RenderBridge};
use render_bridge::model::MapModel;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SurveyConfig;
use workflow::runner::{Runner, WorkflowResult};

mod generator;
mod loader;
mod render_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Radar reflectivity survey mapper")]
struct Args {
    /// Survey config (YAML); without it the synthetic defaults apply
    #[arg(long)]
    config: Option<PathBuf>,
    /// Process a synthetic survey instead of the configured capture files
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Override the alignment time step (seconds)
    #[arg(long)]
    time_step: Option<f64>,
    /// Override the receiver impedance (ohms)
    #[arg(long)]
    impedance: Option<f64>,
    /// Write the assembled map as JSON
    #[arg(long)]
    output: Option<PathBuf>,
    /// Append a one-line summary of offline runs to this file
    #[arg(long, default_value = "data/survey_report.log")]
    report: PathBuf,
    /// Keep the render bridge alive for renderers and incoming captures
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value_t = default_bind_address())]
    bind: SocketAddr,
}

fn write_map(path: &Path, model: &MapModel) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(model).context("serializing map")?;
    fs::write(path, json).with_context(|| format!("writing map {}", path.display()))?;
    Ok(())
}

/// Summary file for this run; only offline runs are reported.
fn report_path(args: &Args) -> Option<&Path> {
    args.offline.then_some(args.report.as_path())
}

fn append_report(path: &Path, source: &str, result: &WorkflowResult) -> anyhow::Result<()> {
    let report = format!(
        "source={} peaks={} aligned={} correlation_lags={} notes={:?}\n",
        source,
        result.peaks.len(),
        result.aligned.len(),
        result.correlation_len,
        result.notes
    );
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening report {}", path.display()))?;
    file.write_all(report.as_bytes())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut survey_config = if let Some(path) = args.config.as_ref() {
        SurveyConfig::load(path)?
    } else {
        SurveyConfig::default()
    };
    survey_config.apply_overrides(args.time_step, args.impedance);

    let runner = Arc::new(Runner::new(&survey_config)?);
    let bridge = RenderBridge::new(runner.clone());

    let (source, capture) = if args.offline {
        let scenario = ScenarioConfig::from_survey(&survey_config);
        ("synthetic", build_capture(&scenario)?)
    } else if survey_config.files.is_some() {
        ("files", loader::load_capture(&survey_config)?)
    } else if args.serve {
        bridge.publish_status("no capture configured; waiting for ingest requests");
        return serve(&bridge, args.bind);
    } else {
        anyhow::bail!(
            "no capture files configured; pass --config with a files section or --offline"
        );
    };

    let result = runner.execute(&capture)?;
    println!(
        "Survey run -> peaks {}, aligned samples {}, map points {}",
        result.peaks.len(),
        result.aligned.len(),
        result.map.len()
    );

    let model = MapModel::from_result(&result);
    bridge.publish(&model);
    bridge.publish_status("survey map ready");

    if let Some(path) = args.output.as_ref() {
        write_map(path, &model)?;
        info!("map written to {}", path.display());
    }
    if let Some(path) = report_path(&args) {
        append_report(path, source, &result)?;
    }

    if args.serve {
        serve(&bridge, args.bind)?;
    }

    Ok(())
}

fn serve(bridge: &RenderBridge, address: SocketAddr) -> anyhow::Result<()> {
    bridge.serve(address);
    bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    runtime.block_on(async {
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        Ok::<(), anyhow::Error>(())
    })
}
