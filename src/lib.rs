//! # Tree-structured parallel summation
//!
//! Sums a fixed-size integer array by distributing the work across a
//! statically-shaped binary tree of worker threads and combining partial
//! results along dedicated channels.
//!
//! ## Protocol
//!
//! 1. **Partition**: split the input into `2^(H-1)` equal chunks, padded
//!    with zeros
//! 2. **Build**: spawn the tree top-down, one isolated worker per node,
//!    one single-use channel per parent-child edge
//! 3. **Reduce**: partial sums flow bottom-up; each worker sends exactly
//!    one message and then holds its position
//! 4. **Shutdown**: after the driver consumes the final value it closes a
//!    shared broadcast, and the tree unwinds through structured joins
//!
//! ## Usage Example
//!
//! ```
//! use treesum::{ReduceConfig, TreeReducer};
//!
//! let config = ReduceConfig::new(3)?;
//! let outcome = TreeReducer::new(config).run(&[1, 2, 3, 4, 5])?;
//! assert_eq!(outcome.sum, 15);
//! # Ok::<(), treesum::ReduceError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

// Core modules - each implements one stage of the protocol
pub mod input;     // Request parsing
pub mod partition; // Chunk table construction
pub mod reduce;    // Worker tree and reduction protocol
pub mod shutdown;  // Close-based termination broadcast
pub mod tree;      // Topology arithmetic

// Re-exports for convenience
pub use input::{ParseError, ReductionRequest};
pub use partition::ChunkTable;
pub use reduce::{NodeReport, NodeState};
pub use shutdown::{ShutdownToken, ShutdownTrigger};
pub use tree::NodeInfo;

use std::io;
use std::sync::Arc;

use crossbeam_channel::bounded;
use thiserror::Error;
use tracing::debug;

/// Largest accepted tree height.
///
/// A tree of height H holds `2^H - 1` workers, so the height must be
/// bounded before any of them exist; 12 caps the tree at 4095 workers.
pub const MAX_HEIGHT: u32 = 12;

/// Validated reduction parameters with the derived tree shape.
#[derive(Debug, Clone)]
pub struct ReduceConfig {
    height: u32,
}

impl ReduceConfig {
    /// Validate a requested tree height.
    ///
    /// This is the sole configuration check: it runs before any worker or
    /// channel is created, and a failure aborts the run with no partial
    /// tree built.
    pub fn new(height: u32) -> Result<Self, ReduceError> {
        if height < 1 || height > MAX_HEIGHT {
            return Err(ReduceError::InvalidHeight {
                given: height,
                max: MAX_HEIGHT,
            });
        }
        Ok(Self { height })
    }

    /// Tree height H, root at level 1.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of leaves: `2^(H-1)`.
    pub fn num_leaves(&self) -> usize {
        1 << (self.height - 1)
    }

    /// Total number of nodes: `2^H - 1`.
    pub fn total_nodes(&self) -> usize {
        (1 << self.height) - 1
    }
}

/// Result of a completed reduction.
#[derive(Debug, Clone)]
pub struct ReduceOutcome {
    /// The aggregated sum, equal to the sum of the original input.
    pub sum: i64,

    /// Structural record of the whole tree, collected as it was reaped.
    pub report: NodeReport,
}

/// Errors surfaced by the reduction engine.
#[derive(Error, Debug)]
pub enum ReduceError {
    /// The requested tree height is outside the accepted range.
    #[error("invalid tree height {given}: must be between 1 and {max}")]
    InvalidHeight {
        /// The height that was requested.
        given: u32,
        /// The largest accepted height.
        max: u32,
    },

    /// The operating system refused to create a worker thread.
    #[error("failed to spawn worker for node {index}")]
    Spawn {
        /// Heap index of the node whose worker could not be created.
        index: usize,
        /// The underlying operating-system error.
        #[source]
        source: io::Error,
    },

    /// An edge closed before its single message arrived.
    #[error("channel for node {index} closed before its result arrived")]
    ChannelClosed {
        /// Heap index of the child whose edge closed early.
        index: usize,
    },

    /// The shutdown broadcast delivered a message instead of closing.
    #[error("shutdown channel delivered a message; closure is the only valid signal")]
    ShutdownPayload,

    /// A worker thread panicked; surfaced when its parent reaps it.
    #[error("worker for node {index} panicked")]
    WorkerPanic {
        /// Heap index of the panicked node.
        index: usize,
    },
}

/// Reduction driver
///
/// Owns the run from partitioning through shutdown: builds the worker
/// tree, consumes the final value from the root's channel, and only then
/// closes the shutdown broadcast and reaps the tree through the root's
/// join handle.
#[derive(Debug)]
pub struct TreeReducer {
    config: ReduceConfig,
}

impl TreeReducer {
    /// Create a reducer for a validated configuration.
    pub fn new(config: ReduceConfig) -> Self {
        Self { config }
    }

    /// Sum `values` across a worker tree shaped by the configuration.
    ///
    /// Blocks until every worker has terminated. The returned outcome
    /// carries both the sum and the reaped tree's structural report.
    pub fn run(&self, values: &[i64]) -> Result<ReduceOutcome, ReduceError> {
        let chunks = Arc::new(partition::partition(&self.config, values));
        debug!(
            height = self.config.height(),
            num_leaves = self.config.num_leaves(),
            input_len = values.len(),
            "partitioned input"
        );

        let (result_tx, result_rx) = bounded(1);
        let (trigger, token) = shutdown::channel();

        let mut root_info = NodeInfo::root();
        if root_info.is_leaf(self.config.height()) {
            root_info = root_info.with_payload(chunks[0].clone());
        }

        let root = reduce::spawn_node(reduce::NodeTask {
            info: root_info,
            outbound: result_tx,
            shutdown: token,
            height: self.config.height(),
            chunks,
        })?;

        // The shutdown broadcast must stay open until the final value has
        // been consumed; closing earlier would be indistinguishable from
        // data loss to a worker mid-send.
        let received = result_rx.recv();
        trigger.signal();

        let report = root
            .join()
            .map_err(|_| ReduceError::WorkerPanic { index: 0 })??;
        let sum = received.map_err(|_| ReduceError::ChannelClosed { index: 0 })?;

        debug!(sum, nodes = report.node_count(), "tree reaped");
        Ok(ReduceOutcome { sum, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_shape_arithmetic() {
        let config = ReduceConfig::new(3).unwrap();
        assert_eq!(config.num_leaves(), 4);
        assert_eq!(config.total_nodes(), 7);

        let config = ReduceConfig::new(1).unwrap();
        assert_eq!(config.num_leaves(), 1);
        assert_eq!(config.total_nodes(), 1);
    }

    #[test]
    fn test_height_bounds() {
        assert!(matches!(
            ReduceConfig::new(0),
            Err(ReduceError::InvalidHeight { given: 0, .. })
        ));
        assert!(matches!(
            ReduceConfig::new(MAX_HEIGHT + 1),
            Err(ReduceError::InvalidHeight { .. })
        ));
        assert!(ReduceConfig::new(MAX_HEIGHT).is_ok());
    }

    #[test]
    fn test_single_node_tree_is_its_own_leaf() {
        let outcome = TreeReducer::new(ReduceConfig::new(1).unwrap())
            .run(&[2, 3, 4])
            .unwrap();
        assert_eq!(outcome.sum, 9);
        assert_eq!(outcome.report.node_count(), 1);
        assert!(outcome.report.is_leaf());
    }
}
