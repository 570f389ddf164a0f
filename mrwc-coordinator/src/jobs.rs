use serde::Serialize;
use tracing::{error, info};

use common::{Chunk, Counts, MapResult, ReduceResult, WorkerKind};

use crate::dispatch::{dispatch_map, dispatch_reduce};
use crate::errors::CoordinatorError;
use crate::partition::split_into_chunks;
use crate::shuffle::{shuffle, ShuffledGroups};
use crate::worker_client::WorkerClient;
use crate::worker_registry::{RegistrySnapshot, SharedRegistry};

/// State of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Job not started.
    Pending,

    /// Splitting the input into chunks.
    Partitioning,

    /// Mapping phase.
    Mapping,

    /// Grouping map output by word.
    Shuffling,

    /// Reducing phase.
    Reducing,

    /// Building the final counts.
    Assembling,

    /// Job completed.
    Completed,

    /// Job stopped on an error.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkersUsed {
    pub mappers: usize,
    pub reducers: usize,
}

/// Everything a finished job produced, from chunks to final counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReport {
    pub success: bool,
    pub workers_used: WorkersUsed,
    pub chunks: Vec<Chunk>,
    pub map_results: Vec<MapResult>,
    pub shuffled: ShuffledGroups,
    pub reduce_results: Vec<ReduceResult>,
    pub final_counts: Counts,
}

/// A job context.
///
/// A job only ever looks at the registry snapshot it was created with, so
/// workers joining or leaving mid-job do not change where its work goes.
#[derive(Debug)]
pub struct Job {
    /// The current state of the job.
    state: JobState,

    /// Workers available to the job.
    workers: RegistrySnapshot,
}

impl Job {
    pub fn new(workers: RegistrySnapshot) -> Self {
        Self {
            state: JobState::Pending,
            workers,
        }
    }

    /// Get the state of the job.
    pub fn get_state(&self) -> JobState {
        self.state
    }

    fn set_state(&mut self, state: JobState) {
        info!("Job {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn check_preconditions(&self) -> Result<(), CoordinatorError> {
        let required = self.workers.requirements;

        if self.workers.mapper_count() < required.mappers_needed() {
            return Err(CoordinatorError::insufficient(
                WorkerKind::Mapper,
                required.mappers_needed(),
                self.workers.mapper_count(),
            ));
        }

        if self.workers.reducer_count() < required.reducers_needed() {
            return Err(CoordinatorError::insufficient(
                WorkerKind::Reducer,
                required.reducers_needed(),
                self.workers.reducer_count(),
            ));
        }

        Ok(())
    }

    /// Run the job to completion on `text`.
    pub async fn run(
        &mut self,
        client: &WorkerClient,
        text: &str,
    ) -> Result<JobReport, CoordinatorError> {
        let result = self.execute(client, text).await;

        match &result {
            Ok(report) => {
                self.set_state(JobState::Completed);
                info!(
                    words = report.final_counts.len(),
                    "MapReduce job complete"
                );
            }
            Err(e) => {
                self.set_state(JobState::Aborted);
                error!("MapReduce job failed: {}", e);
            }
        }

        result
    }

    async fn execute(
        &mut self,
        client: &WorkerClient,
        text: &str,
    ) -> Result<JobReport, CoordinatorError> {
        self.check_preconditions()?;

        info!(
            mappers = self.workers.mapper_count(),
            reducers = self.workers.reducer_count(),
            "Starting MapReduce job"
        );

        // 1. Partition, one chunk per available mapper.
        self.set_state(JobState::Partitioning);
        let chunks = split_into_chunks(text, self.workers.mapper_count());
        info!("Split into {} chunks", chunks.len());

        // 2. Map.
        self.set_state(JobState::Mapping);
        let map_results = dispatch_map(client, &self.workers.mappers, &chunks).await?;
        info!("Map results received: {}", map_results.len());

        // 3. Shuffle.
        self.set_state(JobState::Shuffling);
        let shuffled = shuffle(&map_results);
        info!("Grouped into {} keys", shuffled.len());

        // 4. Reduce.
        self.set_state(JobState::Reducing);
        let reduce_results = dispatch_reduce(client, &self.workers.reducers, &shuffled).await;
        info!("Reduce results received: {}", reduce_results.len());

        // 5. Assemble.
        self.set_state(JobState::Assembling);
        let final_counts = assemble(&reduce_results);

        Ok(JobReport {
            success: true,
            workers_used: WorkersUsed {
                mappers: self.workers.mapper_count(),
                reducers: self.workers.reducer_count(),
            },
            chunks,
            map_results,
            shuffled,
            reduce_results,
            final_counts,
        })
    }
}

/// Final word counts, in the order the reducers' results are listed.
pub fn assemble(reduce_results: &[ReduceResult]) -> Counts {
    reduce_results
        .iter()
        .map(|result| (result.word.clone(), result.count))
        .collect()
}

/// Snapshot the registry and run one job against it.
pub async fn run_job(
    registry: &SharedRegistry,
    client: &WorkerClient,
    text: &str,
) -> Result<JobReport, CoordinatorError> {
    let workers = { registry.lock().await.snapshot() };

    Job::new(workers).run(client, text).await
}
