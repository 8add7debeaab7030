//! Worker spawn loop and per-node protocol
//!
//! The same recursive procedure runs at every node: a leaf sums its chunk,
//! an internal node spawns its two children and combines their partial
//! sums. Everything a worker touches is moved into it by value - the only
//! shared data is the read-only chunk table behind an `Arc`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use tracing::{debug, info};

use super::{NodeReport, NodeState};
use crate::partition::ChunkTable;
use crate::shutdown::ShutdownToken;
use crate::tree::NodeInfo;
use crate::ReduceError;

/// Everything a worker needs, assembled by its parent before the spawn.
///
/// No field refers back to the parent: once spawned, the worker's only
/// ties to the rest of the tree are the outbound channel and the shutdown
/// token.
#[derive(Debug)]
pub struct NodeTask {
    /// Identity of the node, payload attached when it will be a leaf.
    pub info: NodeInfo,

    /// Write end of the edge to the parent. One message, ever.
    pub outbound: Sender<i64>,

    /// Inherited read end of the shutdown broadcast.
    pub shutdown: ShutdownToken,

    /// Height of the whole tree; nodes at this level are leaves.
    pub height: u32,

    /// Shared read-only chunk table, consulted when creating leaf children.
    pub chunks: Arc<ChunkTable>,
}

/// Spawn the worker thread for one node.
///
/// The thread is named after the node so trace output carries a usable
/// worker identity. Failure to spawn is fatal to the whole run: the tree
/// is built eagerly and a partially built tree has no defined recovery.
pub fn spawn_node(
    task: NodeTask,
) -> Result<JoinHandle<Result<NodeReport, ReduceError>>, ReduceError> {
    let index = task.info.index;
    thread::Builder::new()
        .name(format!("node-{index}"))
        .spawn(move || run_node(task))
        .map_err(|source| ReduceError::Spawn { index, source })
}

fn run_node(task: NodeTask) -> Result<NodeReport, ReduceError> {
    debug!(node = %task.info, state = %NodeState::Computing, "worker started");
    if task.info.is_leaf(task.height) {
        run_leaf(task)
    } else {
        run_internal(task)
    }
}

/// Leaf protocol: sum the chunk, send, hold until shutdown.
fn run_leaf(task: NodeTask) -> Result<NodeReport, ReduceError> {
    let NodeTask {
        info,
        outbound,
        shutdown,
        ..
    } = task;

    let sum: i64 = info.payload.as_deref().unwrap_or(&[]).iter().sum();
    info!(
        worker = worker_name().as_str(),
        index = info.index,
        level = info.level,
        position = info.position,
        sum,
        "computed sum"
    );

    outbound
        .send(sum)
        .map_err(|_| ReduceError::ChannelClosed { index: info.index })?;
    drop(outbound);
    debug!(node = %info, state = %NodeState::ResultSent, "result sent");

    await_shutdown(&info, &shutdown)?;

    info!(
        worker = worker_name().as_str(),
        index = info.index,
        state = %NodeState::Terminated,
        "terminated"
    );
    Ok(NodeReport {
        index: info.index,
        level: info.level,
        position: info.position,
        value: sum,
        children: Vec::new(),
    })
}

/// Internal-node protocol: spawn both subtrees, combine, send, hold until
/// shutdown, then reap.
fn run_internal(task: NodeTask) -> Result<NodeReport, ReduceError> {
    let NodeTask {
        info,
        outbound,
        shutdown,
        height,
        chunks,
    } = task;

    let (left_tx, left_rx) = bounded(1);
    let (right_tx, right_rx) = bounded(1);

    // Left is always created before right; only trace ordering depends on
    // it, the combination is commutative.
    let left_info = leaf_ready(info.left_child(), height, &chunks);
    let right_info = leaf_ready(info.right_child(), height, &chunks);
    let (left_index, right_index) = (left_info.index, right_info.index);

    let left = spawn_node(NodeTask {
        info: left_info,
        outbound: left_tx,
        shutdown: shutdown.clone(),
        height,
        chunks: Arc::clone(&chunks),
    })?;
    let right = spawn_node(NodeTask {
        info: right_info,
        outbound: right_tx,
        shutdown: shutdown.clone(),
        height,
        chunks,
    })?;

    // The write ends moved into the children, so each edge closes exactly
    // when its child drops its sender. These two receives are the only
    // place an internal node suspends on its children.
    let left_sum = left_rx
        .recv()
        .map_err(|_| ReduceError::ChannelClosed { index: left_index })?;
    let right_sum = right_rx
        .recv()
        .map_err(|_| ReduceError::ChannelClosed { index: right_index })?;
    let total = left_sum + right_sum;

    if info.index == 0 {
        info!(
            worker = worker_name().as_str(),
            index = info.index,
            level = info.level,
            position = info.position,
            left = left_sum,
            right = right_sum,
            sum = total,
            "final sum"
        );
    } else {
        info!(
            worker = worker_name().as_str(),
            index = info.index,
            level = info.level,
            position = info.position,
            left = left_sum,
            right = right_sum,
            sum = total,
            "combined partial sums"
        );
    }

    outbound
        .send(total)
        .map_err(|_| ReduceError::ChannelClosed { index: info.index })?;
    drop(outbound);
    debug!(node = %info, state = %NodeState::ResultSent, "result sent");

    // Shutdown first, reap second: the children block on the same close,
    // so they are never reaped before they have observed it, and the
    // termination trace of a parent always follows its children's sends.
    await_shutdown(&info, &shutdown)?;
    let left_report = join_child(left, left_index)?;
    let right_report = join_child(right, right_index)?;

    info!(
        worker = worker_name().as_str(),
        index = info.index,
        state = %NodeState::Terminated,
        "terminated"
    );
    Ok(NodeReport {
        index: info.index,
        level: info.level,
        position: info.position,
        value: total,
        children: vec![left_report, right_report],
    })
}

/// Attach the owned chunk when the child will sit on the leaf level.
fn leaf_ready(child: NodeInfo, height: u32, chunks: &Arc<ChunkTable>) -> NodeInfo {
    if child.is_leaf(height) {
        let chunk = chunks[child.position].clone();
        child.with_payload(chunk)
    } else {
        child
    }
}

fn await_shutdown(info: &NodeInfo, shutdown: &ShutdownToken) -> Result<(), ReduceError> {
    debug!(node = %info, state = %NodeState::AwaitingShutdown, "waiting for shutdown");
    shutdown.wait()
}

fn join_child(
    handle: JoinHandle<Result<NodeReport, ReduceError>>,
    index: usize,
) -> Result<NodeReport, ReduceError> {
    handle
        .join()
        .map_err(|_| ReduceError::WorkerPanic { index })?
}

fn worker_name() -> String {
    thread::current().name().unwrap_or("unnamed").to_owned()
}
