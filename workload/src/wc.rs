//! A MapReduce-compatible application that counts word occurrences.
//!

use common::{Chunk, Counts, MapResult, ReduceRequest, ReduceResult};

/// Label under which a reducer reports a contributing mapper.
pub fn mapper_label(mapper_id: usize) -> String {
    format!("Mapper-{}", mapper_id)
}

/// Count the lowercased words of a chunk.
///
/// The result is tagged with the chunk id, which is how the rest of the
/// pipeline identifies the mapper that produced it.
pub fn map(chunk: &Chunk) -> MapResult {
    let mut counts = Counts::new();

    for word in chunk.text.split_whitespace() {
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }

    MapResult {
        mapper_id: chunk.id,
        counts,
    }
}

/// Sum the partial counts of a single word.
pub fn reduce(request: &ReduceRequest) -> ReduceResult {
    let count = request.values.iter().map(|value| value.count).sum();
    let sources = request
        .values
        .iter()
        .map(|value| mapper_label(value.mapper_id))
        .collect();

    ReduceResult {
        word: request.word.clone(),
        count,
        sources,
    }
}
