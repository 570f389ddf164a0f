use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

use common::{endpoint_url, Chunk, MapRequest, MapResult, ReduceRequest, ReduceResult};

use crate::worker_info::WorkerEndpoint;

/// HTTP client for talking to mappers and reducers.
///
/// Every call is bounded by the timeout given at construction; a call
/// that runs past it fails like any other.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    http: reqwest::Client,
}

impl WorkerClient {
    pub fn new(call_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .context("failed to build worker HTTP client")?;

        Ok(Self { http })
    }

    /// Ask a mapper to count the words of `chunk`.
    pub async fn map(&self, mapper: &WorkerEndpoint, chunk: &Chunk) -> anyhow::Result<MapResult> {
        let request = MapRequest {
            chunk: chunk.clone(),
        };

        self.post(mapper, "map", &request)
            .await
            .with_context(|| format!("map of chunk {} on {}", chunk.id, mapper.address))
    }

    /// Ask a reducer to fold the contributions for one word.
    pub async fn reduce(
        &self,
        reducer: &WorkerEndpoint,
        request: &ReduceRequest,
    ) -> anyhow::Result<ReduceResult> {
        self.post(reducer, "reduce", request)
            .await
            .with_context(|| format!("reduce of `{}` on {}", request.word, reducer.address))
    }

    async fn post<B, R>(&self, worker: &WorkerEndpoint, route: &str, body: &B) -> anyhow::Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = endpoint_url(&worker.address, route)?;

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<R>().await?)
    }
}
