//! The worker's HTTP surface.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use common::{
    HealthResponse, MapRequest, MapResult, ReduceRequest, ReduceResult, WorkerKind, Workload,
};

#[derive(Clone)]
pub struct MRWorker {
    kind: WorkerKind,
    address: String,
    workload: Workload,
}

impl MRWorker {
    pub fn new(kind: WorkerKind, address: impl Into<String>, workload: Workload) -> Self {
        Self {
            kind,
            address: address.into(),
            workload,
        }
    }

    /// Routes for this worker. A mapper only serves `/map`, a reducer only
    /// serves `/reduce`; both answer `/health`.
    pub fn router(self) -> Router {
        let router = Router::new().route("/health", get(health));

        let router = match self.kind {
            WorkerKind::Mapper => router.route("/map", post(map)),
            WorkerKind::Reducer => router.route("/reduce", post(reduce)),
        };

        router.with_state(self)
    }
}

/// Serve the worker on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    worker: MRWorker,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    axum::serve(listener, worker.router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

async fn map(State(worker): State<MRWorker>, Json(request): Json<MapRequest>) -> Json<MapResult> {
    info!("[Mapper {}] Processing chunk {}", worker.address, request.chunk.id);

    let result = (worker.workload.map_fn)(&request.chunk);
    debug!("[Mapper {}] Result: {:?}", worker.address, result.counts);

    Json(result)
}

async fn reduce(
    State(worker): State<MRWorker>,
    Json(request): Json<ReduceRequest>,
) -> Json<ReduceResult> {
    debug!(
        "[Reducer {}] Processing word `{}` from {} mappers",
        worker.address,
        request.word,
        request.values.len()
    );

    let result = (worker.workload.reduce_fn)(&request);
    info!(
        "[Reducer {}] Total count for `{}`: {}",
        worker.address, result.word, result.count
    );

    Json(result)
}

async fn health(State(worker): State<MRWorker>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        kind: worker.kind,
        address: worker.address,
    })
}
