//! The coordinator's HTTP surface.

use std::time::Duration;

use anyhow::anyhow;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use common::{RegisterResponse, UnregisterResponse, WorkerKind};

use crate::errors::CoordinatorError;
use crate::jobs::{run_job, JobReport};
use crate::worker_client::WorkerClient;
use crate::worker_info::{WorkerEndpoint, WorkerEntry};
use crate::worker_registry::{Requirements, SharedRegistry, WorkerRegistry};

#[derive(Debug, Clone)]
pub struct MRCoordinator {
    registry: SharedRegistry,
    client: WorkerClient,
}

impl MRCoordinator {
    pub fn new(requirements: Requirements, call_timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            registry: WorkerRegistry::new(requirements).shared(),
            client: WorkerClient::new(call_timeout)?,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/unregister", post(unregister))
            .route("/workers", get(workers))
            .route("/mapreduce", post(mapreduce))
            .layer(CorsLayer::permissive())
            .with_state(self)
    }
}

/// Serve the coordinator on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    coordinator: MRCoordinator,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    axum::serve(listener, coordinator.router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

/////////////////////////////////////////////////////////////////////////////
// Request and response bodies
/////////////////////////////////////////////////////////////////////////////

/// Body of `/register` and `/unregister`, before validation.
#[derive(Debug, Deserialize)]
struct WorkerFields {
    #[serde(rename = "type")]
    kind: Option<String>,
    address: Option<String>,
}

impl WorkerFields {
    fn into_endpoint(self) -> Result<WorkerEndpoint, CoordinatorError> {
        WorkerEndpoint::from_fields(self.kind.as_deref(), self.address.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct MapReduceRequest {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct WorkerCounts {
    mappers: usize,
    reducers: usize,
}

#[derive(Debug, Serialize)]
struct WorkersResponse {
    mappers: Vec<WorkerEntry>,
    reducers: Vec<WorkerEntry>,
    counts: WorkerCounts,
    requirements: Requirements,
    ready: bool,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, CoordinatorError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| CoordinatorError::Validation(rejection.body_text()))
}

/////////////////////////////////////////////////////////////////////////////
// Handlers
/////////////////////////////////////////////////////////////////////////////

async fn register(
    State(coordinator): State<MRCoordinator>,
    payload: Result<Json<WorkerFields>, JsonRejection>,
) -> Result<Json<RegisterResponse>, CoordinatorError> {
    let endpoint = json_body(payload)?.into_endpoint()?;

    let mut registry = coordinator.registry.lock().await;
    let registration = registry.register_worker(endpoint);

    let message = if registration.newly_registered {
        "Registration successful"
    } else {
        "Already registered"
    };

    Ok(Json(RegisterResponse {
        success: true,
        message: message.to_string(),
        worker_id: registration.worker_id,
        total_mappers: registry.len(WorkerKind::Mapper),
        total_reducers: registry.len(WorkerKind::Reducer),
    }))
}

async fn unregister(
    State(coordinator): State<MRCoordinator>,
    payload: Result<Json<WorkerFields>, JsonRejection>,
) -> Result<Json<UnregisterResponse>, CoordinatorError> {
    let endpoint = json_body(payload)?.into_endpoint()?;

    let removed = coordinator.registry.lock().await.unregister_worker(&endpoint);
    if !removed {
        debug!("{} at {} was not registered", endpoint.kind, endpoint.address);
    }

    Ok(Json(UnregisterResponse { success: true }))
}

async fn workers(State(coordinator): State<MRCoordinator>) -> Json<WorkersResponse> {
    let snapshot = { coordinator.registry.lock().await.snapshot() };

    Json(WorkersResponse {
        mappers: snapshot.entries(WorkerKind::Mapper),
        reducers: snapshot.entries(WorkerKind::Reducer),
        counts: WorkerCounts {
            mappers: snapshot.mapper_count(),
            reducers: snapshot.reducer_count(),
        },
        requirements: snapshot.requirements,
        ready: snapshot.ready(),
    })
}

async fn mapreduce(
    State(coordinator): State<MRCoordinator>,
    payload: Result<Json<MapReduceRequest>, JsonRejection>,
) -> Result<Json<JobReport>, CoordinatorError> {
    let text = json_body(payload)?
        .text
        .ok_or_else(|| CoordinatorError::Validation("Missing required field: text".to_string()))?;

    info!("Received MapReduce job ({} bytes of input)", text.len());

    // The job runs on its own task so that a panic anywhere in it comes
    // back here as an error instead of tearing down the connection.
    let MRCoordinator { registry, client } = coordinator;
    let job = tokio::spawn(async move { run_job(&registry, &client, &text).await });

    let report = job
        .await
        .map_err(|e| CoordinatorError::Internal(anyhow!("MapReduce job failed: {}", e)))??;

    Ok(Json(report))
}
