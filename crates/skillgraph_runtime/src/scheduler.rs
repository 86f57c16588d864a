//! The execution engine: entry discovery, node stepping, suspension,
//! resumption, cycle guarding, and interrupt containment.
//!
//! The engine does not model time. After each node's effect body it
//! suspends and hands control back to the host; whatever system drives
//! animations or VFX decides when to call `proceed`. A run that never
//! receives `proceed` stalls forever and is abandoned by dropping the
//! scheduler and its context together.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, warn};

use skillgraph_types::{Graph, NodeId};

use crate::context::RuntimeContext;
use crate::eval::Evaluator;
use crate::registry::{NodeBehavior, NodeRegistry};

/// Observer hook fired after a node's effect body ran (animation, VFX)
pub type NodeObserver = Box<dyn FnMut(NodeId) + Send>;

/// One in-flight run over a shared, read-only graph.
///
/// All per-run traversal state lives here; the graph and registry carry
/// none, so both can back any number of concurrent runs.
pub struct Scheduler {
    graph: Arc<Graph>,
    registry: Arc<NodeRegistry>,
    visited: HashSet<NodeId>,
    current: Option<NodeId>,
    observers: Vec<NodeObserver>,
}

impl Scheduler {
    /// Create a scheduler for one run of the given graph
    pub fn new(graph: Arc<Graph>, registry: Arc<NodeRegistry>) -> Self {
        Self {
            graph,
            registry,
            visited: HashSet::new(),
            current: None,
            observers: Vec::new(),
        }
    }

    /// Register an "executed" observer, fired after every node body
    pub fn on_node_executed(&mut self, observer: impl FnMut(NodeId) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// The node the run is currently suspended at, if any
    pub fn current_node(&self) -> Option<NodeId> {
        self.current
    }

    /// Start the run: discover entry nodes and step each in graph
    /// order. Returns the suspension point (the last stepped node), or
    /// `None` when the graph has no entries or the run was interrupted.
    pub fn run(&mut self, ctx: &mut RuntimeContext) -> Option<NodeId> {
        let entries = self.graph.entry_nodes();
        if entries.is_empty() {
            warn!("graph has no entry nodes, run ends having done nothing");
            return None;
        }

        for entry in entries {
            self.step(entry, ctx);
        }
        self.current
    }

    /// Resume the run: walk every outgoing signal connection of the
    /// suspended node and step each destination (fan-out, in
    /// connection-registration order). Calling this with no pending
    /// node is a warned no-op.
    pub fn proceed(&mut self, ctx: &mut RuntimeContext) -> Option<NodeId> {
        let Some(node) = self.current.take() else {
            warn!("proceed called with no pending node");
            return None;
        };

        for successor in self.graph.signal_successors(node) {
            self.step(successor, ctx);
        }
        self.current
    }

    /// Execute one node's effect body, then suspend there.
    ///
    /// Re-entering an already-visited node is a soft stop for that
    /// branch only; a body fault interrupts the entire run.
    fn step(&mut self, node: NodeId, ctx: &mut RuntimeContext) {
        if !self.visited.insert(node) {
            warn!(node_id = %node, "control-flow re-entry, stopping this branch");
            return;
        }

        if ctx.is_interrupted() {
            debug!(node_id = %node, "run interrupted, skipping node");
            return;
        }

        let graph = Arc::clone(&self.graph);
        let Some(node_ref) = graph.node(node) else {
            error!(node_id = %node, "node vanished from graph, interrupting run");
            ctx.interrupt();
            return;
        };
        let Some(behavior) = self.registry.behavior(&node_ref.kind) else {
            error!(
                node_id = %node,
                kind = %node_ref.kind,
                "no behavior registered for node kind, interrupting run"
            );
            ctx.interrupt();
            return;
        };

        // A node that cannot resolve its inputs cannot run; treat it
        // like a body fault.
        let inputs = match Evaluator::new(&graph, &self.registry).gather_inputs(ctx, node_ref) {
            Ok(inputs) => inputs,
            Err(err) => {
                error!(
                    node_id = %node,
                    kind = %node_ref.kind,
                    error = %err,
                    "node input resolution failed, interrupting run"
                );
                ctx.interrupt();
                return;
            }
        };

        debug!(node_id = %node, kind = %node_ref.kind, "executing node");
        if let Err(fault) = behavior.execute(node_ref, &inputs, ctx) {
            error!(
                node_id = %node,
                kind = %node_ref.kind,
                error = %fault,
                "node execution failed, interrupting run"
            );
            ctx.interrupt();
            return;
        }

        for observer in &mut self.observers {
            observer(node);
        }

        // Suspend here; outgoing connections wait for proceed()
        if let Some(dropped) = self.current.replace(node) {
            // Single-active-branch semantics: a sibling branch stepped
            // earlier in this same call loses its continuation.
            warn!(
                node_id = %dropped,
                replaced_by = %node,
                "suspension point replaced, earlier branch will not resume"
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
