use indexmap::IndexMap;

use common::{Contribution, MapResult};

/// Contributions grouped by word, in the order words were first seen.
///
/// The order matters: reducers are assigned round-robin over it.
pub type ShuffledGroups = IndexMap<String, Vec<Contribution>>;

/// Group the partial counts of every mapper by word.
pub fn shuffle(map_results: &[MapResult]) -> ShuffledGroups {
    let mut grouped = ShuffledGroups::new();

    for result in map_results {
        for (word, &count) in &result.counts {
            grouped.entry(word.clone()).or_default().push(Contribution {
                mapper_id: result.mapper_id,
                count,
            });
        }
    }

    grouped
}
