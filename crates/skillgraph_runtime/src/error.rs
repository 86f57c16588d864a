//! Runtime error taxonomy.
//!
//! Only conditions a caller can act on become error values. The soft
//! conditions (control-flow re-entry, dangling proceed, no entry nodes,
//! unresolved character references) are logged and absorbed where they
//! occur; a node-body fault is contained by the scheduler and turned
//! into the run's interrupt flag.

use skillgraph_types::NodeId;
use thiserror::Error;

/// A failure raised inside a node body (execute or evaluate).
///
/// Faults never escape the scheduler: it logs them with the node's
/// identity and interrupts the run.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NodeFault {
    message: String,
}

impl NodeFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why a data evaluation could not produce a value
#[derive(Debug, Error)]
pub enum EvalError {
    /// The value subgraph loops back into a node still being evaluated.
    /// Fatal to this one evaluate call only; the run is not interrupted
    /// when the query came from the host.
    #[error("cyclic data dependency re-entering node {node}")]
    CyclicDataDependency { node: NodeId },

    #[error("node {0} does not exist in this graph")]
    UnknownNode(NodeId),

    #[error("node {node} has no value port named '{port}'")]
    UnknownPort { node: NodeId, port: String },

    #[error("no node kind '{0}' is registered")]
    UnknownKind(String),

    #[error("node {node} ({kind}) failed to evaluate: {fault}")]
    NodeFailed {
        node: NodeId,
        kind: String,
        #[source]
        fault: NodeFault,
    },
}
