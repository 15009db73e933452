//! Splitting large inserts into calls the document service accepts

/// Consecutive chunks of at most `max_rows` rows; `max_rows == 0` sends
/// everything in one chunk. No rows means no chunks.
pub fn chunk_rows<T>(rows: &[T], max_rows: usize) -> std::slice::Chunks<'_, T> {
    let size = if max_rows == 0 { rows.len().max(1) } else { max_rows };
    rows.chunks(size)
}

/// Number of calls [`chunk_rows`] will produce
pub fn chunk_count(rows: usize, max_rows: usize) -> usize {
    match (rows, max_rows) {
        (0, _) => 0,
        (_, 0) => 1,
        (n, c) => n.div_ceil(c),
    }
}
