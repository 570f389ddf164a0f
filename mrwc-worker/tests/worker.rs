use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use common::{
    HealthResponse, MapResult, ReduceResult, RegisterResponse, UnregisterResponse, WorkerKind,
    WorkerRegistration,
};
use mrwc_worker::{serve, CoordinatorLink, MRWorker};

/// Start a worker of `kind` and return its base URL.
async fn start_worker(kind: WorkerKind, shutdown: CancellationToken) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let worker = MRWorker::new(kind, address.clone(), workload::try_named("wc").unwrap());

    tokio::spawn(serve(listener, worker, shutdown));

    address
}

#[tokio::test]
async fn mapper_counts_words() {
    let shutdown = CancellationToken::new();
    let address = start_worker(WorkerKind::Mapper, shutdown.clone()).await;

    let result: MapResult = reqwest::Client::new()
        .post(format!("{address}/map"))
        .json(&json!({ "chunk": { "id": 1, "text": "Lazy dog the fox the" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result.mapper_id, 1);
    let counts: Vec<(&str, u64)> = result
        .counts
        .iter()
        .map(|(word, count)| (word.as_str(), *count))
        .collect();
    assert_eq!(
        counts,
        vec![("lazy", 1), ("dog", 1), ("the", 2), ("fox", 1)]
    );

    shutdown.cancel();
}

#[tokio::test]
async fn reducer_sums_contributions() {
    let shutdown = CancellationToken::new();
    let address = start_worker(WorkerKind::Reducer, shutdown.clone()).await;

    let result: ReduceResult = reqwest::Client::new()
        .post(format!("{address}/reduce"))
        .json(&json!({
            "word": "the",
            "values": [
                { "mapperId": 0, "count": 2 },
                { "mapperId": 1, "count": 1 },
            ],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result.word, "the");
    assert_eq!(result.count, 3);
    assert_eq!(result.sources, vec!["Mapper-0", "Mapper-1"]);

    shutdown.cancel();
}

#[tokio::test]
async fn workers_only_serve_their_own_kind() {
    let shutdown = CancellationToken::new();
    let mapper = start_worker(WorkerKind::Mapper, shutdown.clone()).await;
    let reducer = start_worker(WorkerKind::Reducer, shutdown.clone()).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{mapper}/reduce"))
        .json(&json!({ "word": "the", "values": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = http
        .post(format!("{reducer}/map"))
        .json(&json!({ "chunk": { "id": 0, "text": "the" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    shutdown.cancel();
}

#[tokio::test]
async fn health_reports_kind_and_address() {
    let shutdown = CancellationToken::new();
    let address = start_worker(WorkerKind::Reducer, shutdown.clone()).await;

    let health: HealthResponse = reqwest::get(format!("{address}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.kind, WorkerKind::Reducer);
    assert_eq!(health.address, address);

    let raw: Value = reqwest::get(format!("{address}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(raw["type"], "reducer");

    shutdown.cancel();
}

/////////////////////////////////////////////////////////////////////////////
// Registration against a stand-in coordinator
/////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Default)]
struct Seen {
    registered: Arc<Mutex<Vec<String>>>,
    unregistered: Arc<Mutex<Vec<String>>>,
}

async fn register(
    State(seen): State<Seen>,
    Json(registration): Json<WorkerRegistration>,
) -> Json<RegisterResponse> {
    let mut registered = seen.registered.lock().unwrap();
    registered.push(registration.address);

    Json(RegisterResponse {
        success: true,
        message: "Registration successful".to_string(),
        worker_id: registered.len() - 1,
        total_mappers: registered.len(),
        total_reducers: 0,
    })
}

async fn unregister(
    State(seen): State<Seen>,
    Json(registration): Json<WorkerRegistration>,
) -> Json<UnregisterResponse> {
    seen.unregistered.lock().unwrap().push(registration.address);
    Json(UnregisterResponse { success: true })
}

async fn start_coordinator(seen: Seen) -> String {
    let router = Router::new()
        .route("/register", post(register))
        .route("/unregister", post(unregister))
        .with_state(seen);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    address
}

fn mapper_registration() -> WorkerRegistration {
    WorkerRegistration {
        kind: WorkerKind::Mapper,
        address: "http://localhost:3001".to_string(),
    }
}

fn link(coordinator: impl Into<String>) -> CoordinatorLink {
    CoordinatorLink::new(coordinator, mapper_registration(), Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn link_registers_and_unregisters() {
    let seen = Seen::default();
    let coordinator = start_coordinator(seen.clone()).await;
    let link = link(coordinator);

    let response = link.register().await.unwrap();
    assert_eq!(response.worker_id, 0);

    link.unregister().await.unwrap();

    assert_eq!(
        *seen.registered.lock().unwrap(),
        vec!["http://localhost:3001".to_string()]
    );
    assert_eq!(
        *seen.unregistered.lock().unwrap(),
        vec!["http://localhost:3001".to_string()]
    );
}

#[tokio::test]
async fn register_fails_without_coordinator() {
    // Nothing listens on the discard port.
    let link = link("http://127.0.0.1:9");

    assert!(link.register().await.is_err());
    assert!(link.unregister().await.is_err());
}

#[tokio::test]
async fn registration_keeps_retrying() {
    let link = link("http://127.0.0.1:9");

    let attempt = tokio::time::timeout(
        Duration::from_millis(300),
        link.register_with_retry(Duration::from_millis(20)),
    )
    .await;

    assert!(attempt.is_err(), "registration should still be retrying");
}

#[tokio::test]
async fn unregister_gives_up_on_a_hung_coordinator() {
    let router = Router::new().route(
        "/unregister",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let coordinator = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    let outcome =
        tokio::time::timeout(Duration::from_secs(5), link(coordinator).unregister()).await;

    let result = outcome.expect("unregister should time out on its own");
    assert!(result.is_err());
}
