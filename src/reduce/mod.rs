//! Reduction protocol
//!
//! One worker thread per tree node. Data flows bottom-up through dedicated
//! single-writer/single-reader channels, one per parent-child edge; each
//! worker sends exactly one partial sum upward, then holds its position
//! until the driver closes the shutdown broadcast.
//!
//! Every worker passes through the same lifecycle regardless of tree
//! position:
//!
//! ```text
//! computing -> result-sent -> awaiting-shutdown -> terminated
//! ```
//!
//! An internal node additionally reaps both children before it counts as
//! terminated, so the driver's single join on the root transitively reaps
//! the whole tree.

mod worker;

pub use worker::{spawn_node, NodeTask};

use std::fmt;

/// Lifecycle phase of a worker, for trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Performing local work or waiting on children's partial sums.
    Computing,

    /// Outbound partial sum delivered, outbound channel closed.
    ResultSent,

    /// Blocked on the shutdown broadcast.
    AwaitingShutdown,

    /// Shutdown observed and, for internal nodes, both children reaped.
    Terminated,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Computing => "computing",
            NodeState::ResultSent => "result-sent",
            NodeState::AwaitingShutdown => "awaiting-shutdown",
            NodeState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// What a worker hands back through its join handle once terminated.
///
/// The driver ends a run holding the root's report, and through it a
/// structural record of every node that existed: a report is only
/// constructed after the node observed shutdown and reaped its children.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "report-json", derive(serde::Serialize))]
pub struct NodeReport {
    /// Heap index of the node.
    pub index: usize,

    /// Tree depth, root = 1.
    pub level: u32,

    /// Rank within the level.
    pub position: usize,

    /// The partial sum this node sent upward.
    pub value: i64,

    /// Reports of the two children, left first. Empty for leaves.
    pub children: Vec<NodeReport>,
}

impl NodeReport {
    /// Number of nodes in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(NodeReport::node_count)
            .sum::<usize>()
    }

    /// Visit this node and every descendant, parents before children.
    pub fn walk(&self, visit: &mut dyn FnMut(&NodeReport)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Whether this node was a leaf worker.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
