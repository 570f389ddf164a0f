//! Fan-out of map and reduce work to remote workers.
//!
//! Both dispatchers issue all of their calls at once and wait for every one
//! of them to resolve. A failed call is logged and its work dropped; nothing
//! is retried or handed to another worker.

use futures::future::join_all;
use tracing::{debug, warn};

use common::{Chunk, MapResult, ReduceRequest, ReduceResult};

use crate::errors::CoordinatorError;
use crate::shuffle::ShuffledGroups;
use crate::worker_client::WorkerClient;
use crate::worker_info::WorkerEndpoint;

/// Send chunk `i` to mapper `i` and collect the results that come back.
///
/// Results are in chunk order. Fails only when calls were made and none
/// of them succeeded.
pub async fn dispatch_map(
    client: &WorkerClient,
    mappers: &[WorkerEndpoint],
    chunks: &[Chunk],
) -> Result<Vec<MapResult>, CoordinatorError> {
    let calls = chunks.iter().zip(mappers).map(|(chunk, mapper)| async move {
        debug!(chunk = chunk.id, "Sending chunk to {}", mapper.address);

        match client.map(mapper, chunk).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Mapper {} failed: {:#}", mapper.address, e);
                None
            }
        }
    });

    let outcomes = join_all(calls).await;
    let attempted = outcomes.len();
    let results: Vec<MapResult> = outcomes.into_iter().flatten().collect();

    if attempted > 0 && results.is_empty() {
        return Err(CoordinatorError::AllMappersFailed { attempted });
    }

    Ok(results)
}

/// The reducer responsible for the word at `index` of the shuffle order.
pub fn reducer_for(reducers: &[WorkerEndpoint], index: usize) -> Option<&WorkerEndpoint> {
    if reducers.is_empty() {
        None
    } else {
        reducers.get(index % reducers.len())
    }
}

/// Send every shuffled word to a reducer, round-robin, and collect the
/// results that come back, in shuffle order.
pub async fn dispatch_reduce(
    client: &WorkerClient,
    reducers: &[WorkerEndpoint],
    shuffled: &ShuffledGroups,
) -> Vec<ReduceResult> {
    let calls = shuffled
        .iter()
        .enumerate()
        .filter_map(|(index, (word, values))| {
            let reducer = reducer_for(reducers, index)?;
            let request = ReduceRequest {
                word: word.clone(),
                values: values.clone(),
            };

            Some(async move {
                debug!("Sending word `{}` to {}", request.word, reducer.address);

                match client.reduce(reducer, &request).await {
                    Ok(result) => Some(result),
                    Err(e) => {
                        warn!("Reducer {} failed: {:#}", reducer.address, e);
                        None
                    }
                }
            })
        });

    join_all(calls).await.into_iter().flatten().collect()
}
