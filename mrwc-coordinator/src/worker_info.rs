use serde::Serialize;

use common::WorkerKind;

use crate::errors::CoordinatorError;

/// Position of a worker in its kind's list.
///
/// IDs shift down whenever an earlier worker of the same kind leaves, so
/// one is only meaningful next to the registry state it was read from.
pub type WorkerID = usize;

/// A registered mapper or reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEndpoint {
    /// What the worker does.
    pub kind: WorkerKind,

    /// Base URL of the worker's HTTP server, e.g. `http://localhost:3001`.
    /// This is also the worker's identity.
    pub address: String,
}

impl WorkerEndpoint {
    pub fn new(kind: WorkerKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }

    /// Build an endpoint from the raw `type` and `address` of a request.
    pub fn from_fields(
        kind: Option<&str>,
        address: Option<&str>,
    ) -> Result<Self, CoordinatorError> {
        let (kind, address) = match (kind, address) {
            (Some(kind), Some(address)) if !kind.is_empty() && !address.is_empty() => {
                (kind, address)
            }
            _ => {
                return Err(CoordinatorError::Validation(
                    "Missing required fields: type and address".to_string(),
                ))
            }
        };

        let kind = kind
            .parse::<WorkerKind>()
            .map_err(|e| CoordinatorError::Validation(e.to_string()))?;

        Ok(Self::new(kind, address))
    }
}

/// How a worker is listed by `/workers`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerEntry {
    pub id: WorkerID,
    pub address: String,
}
