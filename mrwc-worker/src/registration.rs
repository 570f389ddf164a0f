//! The handshake a worker performs with the coordinator.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use common::{endpoint_url, RegisterResponse, UnregisterResponse, WorkerRegistration};

/// A worker's link to its coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorLink {
    http: reqwest::Client,
    coordinator: String,
    registration: WorkerRegistration,
}

impl CoordinatorLink {
    /// Every request to the coordinator gives up after `timeout`.
    pub fn new(
        coordinator: impl Into<String>,
        registration: WorkerRegistration,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build coordinator client")?;

        Ok(Self {
            http,
            coordinator: coordinator.into(),
            registration,
        })
    }

    /// Register once.
    pub async fn register(&self) -> anyhow::Result<RegisterResponse> {
        let url = endpoint_url(&self.coordinator, "register")?;

        let response = self
            .http
            .post(url)
            .json(&self.registration)
            .send()
            .await
            .with_context(|| format!("coordinator at {} unreachable", self.coordinator))?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Register, trying again every `retry` until the coordinator accepts.
    pub async fn register_with_retry(&self, retry: Duration) -> RegisterResponse {
        loop {
            info!(
                "Attempting to register {} at {} with coordinator at {}...",
                self.registration.kind, self.registration.address, self.coordinator
            );

            match self.register().await {
                Ok(response) => {
                    info!(
                        "Registered (ID={}); total mappers: {}, total reducers: {}",
                        response.worker_id, response.total_mappers, response.total_reducers
                    );
                    return response;
                }
                Err(e) => {
                    warn!("Failed to register with coordinator: {:#}", e);
                    info!("Will retry in {:?}", retry);
                    tokio::time::sleep(retry).await;
                }
            }
        }
    }

    /// Leave the coordinator's registry.
    pub async fn unregister(&self) -> anyhow::Result<()> {
        let url = endpoint_url(&self.coordinator, "unregister")?;

        self.http
            .post(url)
            .json(&self.registration)
            .send()
            .await?
            .error_for_status()?
            .json::<UnregisterResponse>()
            .await?;

        Ok(())
    }
}
