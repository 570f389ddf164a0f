use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use common::WorkerKind;

use crate::worker_info::*;

/// The registry as shared between request handlers.
pub type SharedRegistry = Arc<Mutex<WorkerRegistry>>;

/// How many workers of each kind a job needs before it may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub min_mappers: usize,
    pub min_reducers: usize,
}

impl Requirements {
    /// Mappers a job needs. A job never runs without at least one.
    pub fn mappers_needed(&self) -> usize {
        self.min_mappers.max(1)
    }

    /// Reducers a job needs. A job never runs without at least one.
    pub fn reducers_needed(&self) -> usize {
        self.min_reducers.max(1)
    }
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            min_mappers: 2,
            min_reducers: 2,
        }
    }
}

/// Outcome of [`WorkerRegistry::register_worker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub worker_id: WorkerID,

    /// False when the address was already registered for this kind.
    pub newly_registered: bool,
}

/// Registry for workers.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    requirements: Requirements,

    /// Mappers in registration order.
    mappers: Vec<WorkerEndpoint>,

    /// Reducers in registration order.
    reducers: Vec<WorkerEndpoint>,
}

impl WorkerRegistry {
    pub fn new(requirements: Requirements) -> Self {
        Self {
            requirements,
            ..Default::default()
        }
    }

    pub fn shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    fn worker_list(&self, kind: WorkerKind) -> &Vec<WorkerEndpoint> {
        match kind {
            WorkerKind::Mapper => &self.mappers,
            WorkerKind::Reducer => &self.reducers,
        }
    }

    fn worker_list_mut(&mut self, kind: WorkerKind) -> &mut Vec<WorkerEndpoint> {
        match kind {
            WorkerKind::Mapper => &mut self.mappers,
            WorkerKind::Reducer => &mut self.reducers,
        }
    }

    /// Add worker to the registry and return its ID.
    ///
    /// Registering an address twice is harmless: the existing ID is
    /// returned and the list is left untouched.
    pub fn register_worker(&mut self, endpoint: WorkerEndpoint) -> Registration {
        let kind = endpoint.kind;
        let workers = self.worker_list_mut(kind);

        if let Some(worker_id) = workers.iter().position(|w| w.address == endpoint.address) {
            info!("{} at {} already registered", kind, endpoint.address);
            return Registration {
                worker_id,
                newly_registered: false,
            };
        }

        let address = endpoint.address.clone();
        workers.push(endpoint);
        let worker_id = workers.len() - 1;

        info!(
            mappers = self.mappers.len(),
            reducers = self.reducers.len(),
            "Registered {} #{} at {}",
            kind,
            worker_id,
            address
        );

        Registration {
            worker_id,
            newly_registered: true,
        }
    }

    /// Remove worker from the registry.
    ///
    /// Every worker of the same kind registered after it moves down one
    /// ID. Returns whether anything was removed.
    pub fn unregister_worker(&mut self, endpoint: &WorkerEndpoint) -> bool {
        let workers = self.worker_list_mut(endpoint.kind);

        match workers.iter().position(|w| w.address == endpoint.address) {
            Some(index) => {
                workers.remove(index);
                info!(
                    mappers = self.mappers.len(),
                    reducers = self.reducers.len(),
                    "Unregistered {} at {}",
                    endpoint.kind,
                    endpoint.address
                );
                true
            }
            None => false,
        }
    }

    /// Number of workers of a given kind.
    pub fn len(&self, kind: WorkerKind) -> usize {
        self.worker_list(kind).len()
    }

    pub fn requirements(&self) -> Requirements {
        self.requirements
    }

    /// Copy the current state of the registry.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            mappers: self.mappers.clone(),
            reducers: self.reducers.clone(),
            requirements: self.requirements,
        }
    }
}

/// An immutable copy of the registry, taken under its lock.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub mappers: Vec<WorkerEndpoint>,
    pub reducers: Vec<WorkerEndpoint>,
    pub requirements: Requirements,
}

impl RegistrySnapshot {
    pub fn mapper_count(&self) -> usize {
        self.mappers.len()
    }

    pub fn reducer_count(&self) -> usize {
        self.reducers.len()
    }

    /// Whether enough workers of both kinds are registered to run a job.
    pub fn ready(&self) -> bool {
        self.mapper_count() >= self.requirements.mappers_needed()
            && self.reducer_count() >= self.requirements.reducers_needed()
    }

    pub fn entries(&self, kind: WorkerKind) -> Vec<WorkerEntry> {
        let workers = match kind {
            WorkerKind::Mapper => &self.mappers,
            WorkerKind::Reducer => &self.reducers,
        };

        workers
            .iter()
            .enumerate()
            .map(|(id, worker)| WorkerEntry {
                id,
                address: worker.address.clone(),
            })
            .collect()
    }
}
