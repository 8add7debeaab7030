//! Input partitioning
//!
//! Splits the input array into `2^(H-1)` equal-length chunks, one per leaf,
//! padding on the right with zeros so the length divides evenly. Runs once,
//! before any worker exists; the resulting table is shared read-only into
//! the tree and outlives it.

use crate::ReduceConfig;

/// Ordered table of equal-length chunks, one per leaf, in input order.
pub type ChunkTable = Vec<Vec<i64>>;

/// Input length after right-padding to a multiple of `num_leaves`.
pub fn padded_length(num_leaves: usize, len: usize) -> usize {
    (len + num_leaves - 1) / num_leaves * num_leaves
}

/// Split `values` into one chunk per leaf of a tree shaped by `config`.
///
/// Padding entries are zero, the neutral element of summation, so they
/// never perturb the result. An empty input produces `num_leaves` empty
/// chunks.
pub fn partition(config: &ReduceConfig, values: &[i64]) -> ChunkTable {
    let num_leaves = config.num_leaves();
    let padded_len = padded_length(num_leaves, values.len());
    let chunk_size = padded_len / num_leaves;

    if chunk_size == 0 {
        return vec![Vec::new(); num_leaves];
    }

    let mut padded = values.to_vec();
    padded.resize(padded_len, 0);

    padded.chunks(chunk_size).map(<[i64]>::to_vec).collect()
}
