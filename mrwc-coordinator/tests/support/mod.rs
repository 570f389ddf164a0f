#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use common::{
    Chunk, Contribution, Counts, MapRequest, MapResult, ReduceResult, RegisterResponse, WorkerKind,
};
use mrwc_coordinator::{serve, MRCoordinator, Requirements};
use mrwc_worker::MRWorker;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    address
}

/// A real word count worker.
pub async fn spawn_worker(kind: WorkerKind) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let worker = MRWorker::new(kind, address.clone(), workload::try_named("wc").unwrap());

    tokio::spawn(async move { axum::serve(listener, worker.router()).await.unwrap() });

    address
}

/// A worker whose every map and reduce call fails.
pub async fn spawn_failing_worker() -> String {
    let router = Router::new()
        .route("/map", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/reduce", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

    spawn_router(router).await
}

/// A mapper that answers correctly, but only after `delay`.
pub async fn spawn_slow_mapper(delay: Duration) -> String {
    let router = Router::new().route(
        "/map",
        post(move |Json(request): Json<MapRequest>| async move {
            tokio::time::sleep(delay).await;
            Json(workload::wc::map(&request.chunk))
        }),
    );

    spawn_router(router).await
}

/// A mapper that counts how often it is called.
pub async fn spawn_counting_mapper(calls: Arc<AtomicUsize>) -> String {
    let router = Router::new().route(
        "/map",
        post(move |Json(request): Json<MapRequest>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Json(workload::wc::map(&request.chunk))
            }
        }),
    );

    spawn_router(router).await
}

/// A coordinator on an ephemeral port, stopped when dropped.
pub struct TestCoordinator {
    pub address: String,
    pub http: reqwest::Client,
    shutdown: CancellationToken,
}

impl TestCoordinator {
    pub async fn start() -> Self {
        Self::with_timeout(Duration::from_secs(5)).await
    }

    pub async fn with_timeout(call_timeout: Duration) -> Self {
        let coordinator = MRCoordinator::new(Requirements::default(), call_timeout).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = CancellationToken::new();

        tokio::spawn(serve(listener, coordinator, shutdown.clone()));

        Self {
            address,
            http: reqwest::Client::new(),
            shutdown,
        }
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}/{}", self.address, route)
    }

    pub async fn post(&self, route: &str, body: Value) -> reqwest::Response {
        self.http.post(self.url(route)).json(&body).send().await.unwrap()
    }

    pub async fn register(&self, kind: WorkerKind, address: &str) -> RegisterResponse {
        let response = self
            .post("register", json!({ "type": kind.as_str(), "address": address }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        response.json().await.unwrap()
    }

    pub async fn unregister(&self, kind: WorkerKind, address: &str) -> reqwest::Response {
        self.post("unregister", json!({ "type": kind.as_str(), "address": address }))
            .await
    }

    pub async fn workers(&self) -> Value {
        self.http
            .get(self.url("workers"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn mapreduce(&self, text: &str) -> reqwest::Response {
        self.post("mapreduce", json!({ "text": text })).await
    }

    /// Register two real mappers and two real reducers.
    pub async fn with_default_workers(self) -> Self {
        for kind in [
            WorkerKind::Mapper,
            WorkerKind::Mapper,
            WorkerKind::Reducer,
            WorkerKind::Reducer,
        ] {
            let address = spawn_worker(kind).await;
            self.register(kind, &address).await;
        }
        self
    }
}

impl Drop for TestCoordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// A successful `/mapreduce` response, keeping the order of every map.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub success: bool,
    pub workers_used: WorkersUsed,
    pub chunks: Vec<Chunk>,
    pub map_results: Vec<MapResult>,
    pub shuffled: IndexMap<String, Vec<Contribution>>,
    pub reduce_results: Vec<ReduceResult>,
    pub final_counts: Counts,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct WorkersUsed {
    pub mappers: usize,
    pub reducers: usize,
}

pub async fn report(response: reqwest::Response) -> Report {
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.json().await.unwrap()
}

pub fn counts(pairs: &[(&str, u64)]) -> Counts {
    pairs
        .iter()
        .map(|(word, count)| (word.to_string(), *count))
        .collect()
}
