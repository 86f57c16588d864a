// Skillgraph Types - Core data structures for the skill-graph system
//
// These types define the structure of skill graphs, nodes, ports, and
// connections. Graphs are plain data: they carry no execution state and
// can be shared read-only between concurrent runs.

pub mod graph;
pub mod value;

pub use graph::{
    ConnectError, Connection, Graph, NodeDef, NodeId, PortCapacity, PortDef, PortDirection,
    PortRef, SkillNode,
};
pub use value::{PortKind, Value};
