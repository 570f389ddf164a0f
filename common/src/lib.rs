//! Types shared between the coordinator and its workers.
//!
//! Everything in here travels over HTTP as JSON, so field names follow the
//! camelCase convention the coordinator's clients already speak.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/////////////////////////////////////////////////////////////////////////////
// Workers
/////////////////////////////////////////////////////////////////////////////

/// The role a worker plays in a job.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    Mapper,
    Reducer,
}

impl WorkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::Mapper => "mapper",
            WorkerKind::Reducer => "reducer",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapper" => Ok(WorkerKind::Mapper),
            "reducer" => Ok(WorkerKind::Reducer),
            other => Err(anyhow!(
                "Invalid worker type `{other}`. Must be \"mapper\" or \"reducer\""
            )),
        }
    }
}

/// Body a worker sends to `/register` and `/unregister`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerRegistration {
    #[serde(rename = "type")]
    pub kind: WorkerKind,
    pub address: String,
}

/// Coordinator's answer to a registration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    /// Position of the worker in its kind's list. Only valid until an
    /// earlier worker of the same kind unregisters.
    pub worker_id: usize,
    pub total_mappers: usize,
    pub total_reducers: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnregisterResponse {
    pub success: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(rename = "type")]
    pub kind: WorkerKind,
    pub address: String,
}

/////////////////////////////////////////////////////////////////////////////
// Map and reduce messages
/////////////////////////////////////////////////////////////////////////////

/// Word counts in first-seen order.
pub type Counts = IndexMap<String, u64>;

/// A contiguous run of input words assigned to one mapper.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the input.
    pub id: usize,

    /// Words of the chunk joined by single spaces.
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapRequest {
    pub chunk: Chunk,
}

/// Partial counts produced by one mapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResult {
    pub mapper_id: usize,
    pub counts: Counts,
}

/// One mapper's count for a single word.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub mapper_id: usize,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReduceRequest {
    pub word: String,
    pub values: Vec<Contribution>,
}

/// Final count for one word, with the labels of the mappers it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReduceResult {
    pub word: String,
    pub count: u64,
    pub sources: Vec<String>,
}

/// Build the URL of `route` on the service listening at `base`.
///
/// `base` is used as given, so `http://host:3000` and `http://host:3000/`
/// both resolve `map` to `http://host:3000/map`.
pub fn endpoint_url(base: &str, route: &str) -> anyhow::Result<Url> {
    let url = format!("{}/{}", base.trim_end_matches('/'), route);
    Url::parse(&url).map_err(|e| anyhow!("invalid address `{base}`: {e}"))
}

/////////////////////////////////////////////////////////////////////////////
// Workload types
/////////////////////////////////////////////////////////////////////////////

/// A map function turns a chunk into partial counts.
pub type MapFn = fn(chunk: &Chunk) -> MapResult;

/// A reduce function folds every contribution for one word into a result.
pub type ReduceFn = fn(request: &ReduceRequest) -> ReduceResult;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}
