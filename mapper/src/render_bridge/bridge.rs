use crate::generator::scenario::{build_capture, ScenarioConfig};
use crate::render_bridge::model::MapModel;
use crate::workflow::runner::Runner;
use anyhow::Context;
use log::{error, info};
use reflectcore::survey::SurveyCapture;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::{runtime::Builder, task};
use warp::{http::StatusCode, Filter};

type SharedModel = Arc<RwLock<MapModel>>;

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

fn store(state: &SharedModel, model: MapModel) {
    let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
    *guard = model;
}

fn reply_for(
    outcome: anyhow::Result<MapModel>,
    state: &SharedModel,
) -> warp::reply::WithStatus<warp::reply::Json> {
    match outcome {
        Ok(model) => {
            let body = json!({
                "status": "ok",
                "peaks": model.peak_count,
                "aligned": model.aligned_count,
            });
            store(state, model);
            warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
        }
        Err(err) => {
            error!("ingest error: {:#}", err);
            warp::reply::with_status(
                warp::reply::json(&json!({"status": "error", "reason": format!("{:#}", err)})),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
    }
}

/// Runs `job` on the blocking pool so the routes stay responsive.
async fn off_runtime<F>(job: F) -> anyhow::Result<MapModel>
where
    F: FnOnce() -> anyhow::Result<MapModel> + Send + 'static,
{
    task::spawn_blocking(job)
        .await
        .context("survey worker panicked")?
}

async fn ingest_capture(
    capture: SurveyCapture,
    state: SharedModel,
    runner: Arc<Runner>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection> {
    let outcome = off_runtime(move || {
        runner
            .execute(&capture)
            .map(|result| MapModel::from_result(&result))
    })
    .await;
    Ok(reply_for(outcome, &state))
}

async fn ingest_scenario(
    config: ScenarioConfig,
    state: SharedModel,
    runner: Arc<Runner>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection> {
    let outcome = off_runtime(move || {
        build_capture(&config)
            .and_then(|capture| runner.execute(&capture))
            .map(|result| MapModel::from_result(&result))
    })
    .await;
    Ok(reply_for(outcome, &state))
}

/// Holds the latest map and serves it over HTTP to an external renderer.
pub struct RenderBridge {
    state: SharedModel,
    runner: Arc<Runner>,
}

impl RenderBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MapModel::default())),
            runner,
        }
    }

    /// Starts the HTTP endpoint on its own thread:
    /// `GET /map`, `GET /status`, `POST /ingest`, `POST /ingest-scenario`.
    pub fn serve(&self, address: SocketAddr) {
        let state = self.state.clone();
        let runner = self.runner.clone();

        thread::spawn(move || {
            let state_filter = warp::any().map(move || state.clone());
            let runner_filter = warp::any().map(move || runner.clone());

            let map_route = warp::path("map")
                .and(warp::get())
                .and(state_filter.clone())
                .map(|state: SharedModel| {
                    let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                    warp::reply::json(&*guard)
                });

            let status_route = warp::path("status")
                .and(warp::get())
                .and(runner_filter.clone())
                .map(|runner: Arc<Runner>| warp::reply::json(&runner.metrics()));

            let ingest_route = warp::path("ingest")
                .and(warp::post())
                .and(warp::body::json())
                .and(state_filter.clone())
                .and(runner_filter.clone())
                .and_then(ingest_capture);

            let scenario_route = warp::path("ingest-scenario")
                .and(warp::post())
                .and(warp::body::json())
                .and(state_filter)
                .and(runner_filter)
                .and_then(ingest_scenario);

            let routes = map_route
                .or(status_route)
                .or(ingest_route)
                .or(scenario_route);

            match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => {
                    info!("render bridge listening on http://{}", address);
                    runtime.block_on(warp::serve(routes).run(address));
                }
                Err(err) => error!("failed to build render bridge runtime: {}", err),
            }
        });
    }

    pub fn publish(&self, model: &MapModel) {
        store(&self.state, model.clone());
        info!(
            "[bridge] map points: {}, peaks: {}",
            model.planar.len(),
            model.peak_count
        );
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> MapModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
