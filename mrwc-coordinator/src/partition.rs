use common::Chunk;

/// Split `text` into at most `num_chunks` runs of consecutive words.
///
/// Every chunk holds `ceil(words / num_chunks)` words except the last,
/// which may be shorter. Blank input produces no chunks at all.
pub fn split_into_chunks(text: &str, num_chunks: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if num_chunks == 0 || words.is_empty() {
        return Vec::new();
    }

    let chunk_size = words.len().div_ceil(num_chunks);

    words
        .chunks(chunk_size)
        .take(num_chunks)
        .enumerate()
        .map(|(id, words)| Chunk {
            id,
            text: words.join(" "),
        })
        .collect()
}
