//! Nodes, ports, connections, and the graph arena.
//!
//! Nodes live in an arena indexed by a stable integer id; connections
//! are stored as endpoint pairs, not object references, so back-edges
//! in the authored graph never create ownership cycles. The graph is
//! authoring data only: execution state lives in the runtime crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::{PortKind, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Ports
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a port on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Declared connection multiplicity of a port.
///
/// Signal inputs are always `Single` (one writer); value inputs default
/// to `Single`; outputs default to `Multiple` (free fan-out).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortCapacity {
    Single,
    Multiple,
}

/// Definition of a port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDef {
    /// Port name (unique within its node, used in connections)
    pub name: String,
    /// Port direction (input or output)
    pub direction: PortDirection,
    /// Kind of value the port carries
    pub kind: PortKind,
    /// How many connections the port accepts
    pub capacity: PortCapacity,
    /// Literal fallback for input ports with no connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PortDef {
    /// Create a signal input port
    pub fn signal_in() -> Self {
        Self {
            name: "in".to_string(),
            direction: PortDirection::Input,
            kind: PortKind::Signal,
            capacity: PortCapacity::Single,
            default: None,
        }
    }

    /// Create a signal output port with a custom name
    pub fn signal_out(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Output,
            kind: PortKind::Signal,
            capacity: PortCapacity::Multiple,
            default: None,
        }
    }

    /// Create a value input port
    pub fn value_in(name: &str, kind: PortKind) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Input,
            kind,
            capacity: PortCapacity::Single,
            default: None,
        }
    }

    /// Create a value input port with a literal fallback
    pub fn value_in_with_default(name: &str, kind: PortKind, default: Value) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Input,
            kind,
            capacity: PortCapacity::Single,
            default: Some(default),
        }
    }

    /// Create a value output port
    pub fn value_out(name: &str, kind: PortKind) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Output,
            kind,
            capacity: PortCapacity::Multiple,
            default: None,
        }
    }

    /// Check if this is a signal port
    pub fn is_signal(&self) -> bool {
        self.kind.is_signal()
    }

    /// Check if this is a value port
    pub fn is_value(&self) -> bool {
        self.kind.is_value()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Definition of a node type (registered in the runtime's catalog).
///
/// Instances in a graph copy the definition's ports at creation time,
/// so the graph stays self-contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique identifier (e.g., "flow/If" or "effect/ModifyStat")
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Category for organization (e.g., "Flow", "Math")
    pub category: String,
    /// Port definitions for this node type
    pub ports: Vec<PortDef>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodeDef {
    /// Get a port by name
    pub fn port(&self, name: &str) -> Option<&PortDef> {
        self.ports.iter().find(|p| p.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes & Connections
// ─────────────────────────────────────────────────────────────────────────────

/// Stable arena index of a node within its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One endpoint of a connection: a node and a port name on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRef {
    pub node: NodeId,
    pub port: String,
}

impl PortRef {
    pub fn new(node: NodeId, port: &str) -> Self {
        Self {
            node,
            port: port.to_string(),
        }
    }
}

/// A directed connection between an output port and an input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: PortRef,
    pub to: PortRef,
}

/// A node instance within a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillNode {
    /// Arena id within the owning graph
    pub id: NodeId,
    /// Node type (references a NodeDef id)
    pub kind: String,
    /// Human-readable display name
    pub name: String,
    /// Ports copied from the node definition
    pub ports: Vec<PortDef>,
    /// Node-specific configuration (stat ids, operators, literals)
    #[serde(default)]
    pub config: serde_json::Value,
}

impl SkillNode {
    /// Get a port by name
    pub fn port(&self, name: &str) -> Option<&PortDef> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// All signal input ports
    pub fn signal_inputs(&self) -> impl Iterator<Item = &PortDef> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input && p.is_signal())
    }

    /// All signal output ports
    pub fn signal_outputs(&self) -> impl Iterator<Item = &PortDef> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Output && p.is_signal())
    }

    /// All value input ports
    pub fn value_inputs(&self) -> impl Iterator<Item = &PortDef> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input && p.is_value())
    }

    /// Get a string from node config
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }

    /// Get a number from node config
    pub fn config_number(&self, key: &str) -> Option<f64> {
        self.config.get(key).and_then(|v| v.as_f64())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Why a connection could not be made
#[derive(Debug, Error, PartialEq)]
pub enum ConnectError {
    #[error("node {0} does not exist in this graph")]
    UnknownNode(NodeId),

    #[error("node {node} has no port named '{port}'")]
    UnknownPort { node: NodeId, port: String },

    #[error("'{port}' on node {node} is not an {expected:?} port")]
    DirectionMismatch {
        node: NodeId,
        port: String,
        expected: PortDirection,
    },

    #[error("cannot connect {from:?} output to {to:?} input")]
    KindMismatch { from: PortKind, to: PortKind },
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph
// ─────────────────────────────────────────────────────────────────────────────

/// A skill graph: an arena of nodes plus the connections between their
/// ports. Owned by the authoring asset; read-only during execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<SkillNode>,
    connections: Vec<Connection>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate a node from its definition
    pub fn add_node(&mut self, def: &NodeDef, config: serde_json::Value) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SkillNode {
            id,
            kind: def.id.clone(),
            name: def.name.clone(),
            ports: def.ports.clone(),
            config,
        });
        id
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&SkillNode> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a node mutably (authoring only; never during execution)
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SkillNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> impl Iterator<Item = &SkillNode> {
        self.nodes.iter()
    }

    /// All connections in registration order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    fn port_of(&self, endpoint: &PortRef) -> Result<&PortDef, ConnectError> {
        let node = self
            .node(endpoint.node)
            .ok_or(ConnectError::UnknownNode(endpoint.node))?;
        node.port(&endpoint.port).ok_or_else(|| ConnectError::UnknownPort {
            node: endpoint.node,
            port: endpoint.port.clone(),
        })
    }

    /// Connect an output port to an input port of the same kind.
    ///
    /// When the destination port only accepts a single writer and is
    /// already wired, the old connection is removed and returned so the
    /// caller (or an authoring UI) can surface the replacement.
    pub fn connect(
        &mut self,
        from: PortRef,
        to: PortRef,
    ) -> Result<Option<Connection>, ConnectError> {
        let from_port = self.port_of(&from)?;
        if from_port.direction != PortDirection::Output {
            return Err(ConnectError::DirectionMismatch {
                node: from.node,
                port: from.port,
                expected: PortDirection::Output,
            });
        }
        let from_kind = from_port.kind;

        let to_port = self.port_of(&to)?;
        if to_port.direction != PortDirection::Input {
            return Err(ConnectError::DirectionMismatch {
                node: to.node,
                port: to.port,
                expected: PortDirection::Input,
            });
        }
        let to_kind = to_port.kind;
        let to_capacity = to_port.capacity;

        if !from_kind.is_compatible_with(&to_kind) {
            return Err(ConnectError::KindMismatch {
                from: from_kind,
                to: to_kind,
            });
        }

        let replaced = if to_capacity == PortCapacity::Single {
            self.connections
                .iter()
                .position(|c| c.to == to)
                .map(|i| self.connections.remove(i))
        } else {
            None
        };

        self.connections.push(Connection { from, to });
        Ok(replaced)
    }

    /// Remove a specific connection, returning it when found
    pub fn disconnect(&mut self, from: &PortRef, to: &PortRef) -> Option<Connection> {
        self.connections
            .iter()
            .position(|c| c.from == *from && c.to == *to)
            .map(|i| self.connections.remove(i))
    }

    /// All connections leaving a specific output port, in registration order
    pub fn connections_from(&self, node: NodeId, port: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.from.node == node && c.from.port == port)
            .collect()
    }

    /// The live incoming connection of an input port, if any
    pub fn incoming(&self, node: NodeId, port: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to.node == node && c.to.port == port)
    }

    /// Destinations of every signal connection leaving a node, in
    /// connection-registration order (the fan-out order for resumption)
    pub fn signal_successors(&self, node: NodeId) -> Vec<NodeId> {
        let Some(source) = self.node(node) else {
            return Vec::new();
        };
        self.connections
            .iter()
            .filter(|c| {
                c.from.node == node
                    && source.port(&c.from.port).is_some_and(|p| p.is_signal())
            })
            .map(|c| c.to.node)
            .collect()
    }

    /// Check if any signal input of a node has a live incoming connection
    pub fn has_live_signal_input(&self, node: &SkillNode) -> bool {
        node.signal_inputs()
            .any(|p| self.incoming(node.id, &p.name).is_some())
    }

    /// All entry nodes, in graph order.
    ///
    /// A node is an entry point iff it has at least one signal output
    /// and no signal input with a live incoming connection.
    pub fn entry_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.signal_outputs().next().is_some() && !self.has_live_signal_input(n))
            .map(|n| n.id)
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
