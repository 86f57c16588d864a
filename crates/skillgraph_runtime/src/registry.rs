//! Node catalog: definitions plus the behavior every node kind
//! implements.
//!
//! The registry holds all available node kinds (built-in and
//! host-provided). A behavior has two optional capabilities: an effect
//! body (`execute`, default no-op) and a value body (`evaluate`,
//! default none). The scheduler resolves a node's value inputs before
//! either is called, so bodies only see concrete values.

use std::collections::HashMap;
use std::sync::Arc;

use skillgraph_types::{Graph, NodeDef, NodeId, SkillNode, Value};

use crate::context::RuntimeContext;
use crate::error::NodeFault;

// ─────────────────────────────────────────────────────────────────────────────
// Resolved Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Value-input snapshot handed to a node body (port name -> value)
#[derive(Debug, Default)]
pub struct PortValues {
    values: HashMap<String, Value>,
}

impl PortValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: &str, value: Value) {
        self.values.insert(port.to_string(), value);
    }

    /// Get an input value by port name
    pub fn get(&self, port: &str) -> Option<&Value> {
        self.values.get(port)
    }

    /// Get input as boolean
    pub fn boolean(&self, port: &str) -> Option<bool> {
        self.values.get(port).and_then(|v| v.as_boolean())
    }

    /// Get input as number
    pub fn number(&self, port: &str) -> Option<f64> {
        self.values.get(port).and_then(|v| v.as_number())
    }

    /// Get input as text
    pub fn text(&self, port: &str) -> Option<&str> {
        self.values.get(port).and_then(|v| v.as_text())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Behavior
// ─────────────────────────────────────────────────────────────────────────────

/// The capability contract every node kind implements.
///
/// Both methods are optional: trigger nodes override neither, pure
/// nodes override `evaluate`, effect and flow nodes override
/// `execute`.
pub trait NodeBehavior: Send + Sync {
    /// Effect body: mutate the run's context (stats, flags, interrupt).
    /// A returned fault is contained by the scheduler: logged with the
    /// node's identity and converted into the run's interrupt.
    fn execute(
        &self,
        node: &SkillNode,
        inputs: &PortValues,
        ctx: &mut RuntimeContext,
    ) -> Result<(), NodeFault> {
        let _ = (node, inputs, ctx);
        Ok(())
    }

    /// Value body: compute one output port's value from the resolved
    /// inputs and configuration. Must not mutate runtime state.
    /// `Ok(None)` falls back to the port's declared default.
    fn evaluate(
        &self,
        node: &SkillNode,
        inputs: &PortValues,
        ctx: &RuntimeContext,
        output: &str,
    ) -> Result<Option<Value>, NodeFault> {
        let _ = (node, inputs, ctx, output);
        Ok(None)
    }
}

/// Behavior with neither body (trigger nodes)
pub struct NoopBehavior;

impl NodeBehavior for NoopBehavior {}

/// Function-based effect behavior (for simple effect/flow nodes)
struct FnEffect<F>
where
    F: Fn(&SkillNode, &PortValues, &mut RuntimeContext) -> Result<(), NodeFault> + Send + Sync,
{
    func: F,
}

impl<F> NodeBehavior for FnEffect<F>
where
    F: Fn(&SkillNode, &PortValues, &mut RuntimeContext) -> Result<(), NodeFault> + Send + Sync,
{
    fn execute(
        &self,
        node: &SkillNode,
        inputs: &PortValues,
        ctx: &mut RuntimeContext,
    ) -> Result<(), NodeFault> {
        (self.func)(node, inputs, ctx)
    }
}

/// Function-based pure behavior (for simple data nodes)
struct FnPure<F>
where
    F: Fn(&SkillNode, &PortValues, &RuntimeContext, &str) -> Result<Option<Value>, NodeFault>
        + Send
        + Sync,
{
    func: F,
}

impl<F> NodeBehavior for FnPure<F>
where
    F: Fn(&SkillNode, &PortValues, &RuntimeContext, &str) -> Result<Option<Value>, NodeFault>
        + Send
        + Sync,
{
    fn evaluate(
        &self,
        node: &SkillNode,
        inputs: &PortValues,
        ctx: &RuntimeContext,
        output: &str,
    ) -> Result<Option<Value>, NodeFault> {
        (self.func)(node, inputs, ctx, output)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Registry
// ─────────────────────────────────────────────────────────────────────────────

struct NodeEntry {
    definition: NodeDef,
    behavior: Arc<dyn NodeBehavior>,
}

/// Registry of all available node kinds
pub struct NodeRegistry {
    entries: HashMap<String, NodeEntry>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create a registry with the built-in combat catalog registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::nodes::register_builtin_nodes(&mut registry);
        registry
    }

    /// Register a node kind with its behavior
    pub fn register(&mut self, definition: NodeDef, behavior: Arc<dyn NodeBehavior>) {
        let id = definition.id.clone();
        self.entries.insert(
            id,
            NodeEntry {
                definition,
                behavior,
            },
        );
    }

    /// Register a node kind with a closure effect body
    pub fn register_effect<F>(&mut self, definition: NodeDef, func: F)
    where
        F: Fn(&SkillNode, &PortValues, &mut RuntimeContext) -> Result<(), NodeFault>
            + Send
            + Sync
            + 'static,
    {
        self.register(definition, Arc::new(FnEffect { func }));
    }

    /// Register a node kind with a closure value body
    pub fn register_pure<F>(&mut self, definition: NodeDef, func: F)
    where
        F: Fn(&SkillNode, &PortValues, &RuntimeContext, &str) -> Result<Option<Value>, NodeFault>
            + Send
            + Sync
            + 'static,
    {
        self.register(definition, Arc::new(FnPure { func }));
    }

    /// Get a node definition by kind id
    pub fn definition(&self, kind: &str) -> Option<&NodeDef> {
        self.entries.get(kind).map(|e| &e.definition)
    }

    /// Get a node behavior by kind id
    pub fn behavior(&self, kind: &str) -> Option<Arc<dyn NodeBehavior>> {
        self.entries.get(kind).map(|e| Arc::clone(&e.behavior))
    }

    /// Instantiate a registered kind into a graph
    pub fn spawn(
        &self,
        graph: &mut Graph,
        kind: &str,
        config: serde_json::Value,
    ) -> Option<NodeId> {
        self.definition(kind).map(|def| graph.add_node(def, config))
    }

    /// All registered kind ids
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgraph_types::{PortDef, PortKind};

    #[test]
    fn test_default_behavior_is_inert() {
        let behavior = NoopBehavior;
        let def = NodeDef {
            id: "test/Noop".to_string(),
            name: "Noop".to_string(),
            category: "Test".to_string(),
            ports: vec![PortDef::signal_out("fire")],
            description: None,
        };
        let mut graph = Graph::new();
        let id = graph.add_node(&def, serde_json::Value::Null);
        let node = graph.node(id).unwrap();

        let mut ctx = crate::context::RuntimeContext::new(
            crate::stats::CharacterId(0),
            Box::new(crate::stats::InMemoryStats::new()),
        );
        let inputs = PortValues::new();
        assert!(behavior.execute(node, &inputs, &mut ctx).is_ok());
        assert!(matches!(
            behavior.evaluate(node, &inputs, &ctx, "anything"),
            Ok(None)
        ));
    }

    #[test]
    fn test_spawn_unknown_kind() {
        let registry = NodeRegistry::new();
        let mut graph = Graph::new();
        assert!(registry.spawn(&mut graph, "missing/Kind", serde_json::Value::Null).is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = NodeRegistry::new();
        registry.register_pure(
            NodeDef {
                id: "test/Two".to_string(),
                name: "Two".to_string(),
                category: "Test".to_string(),
                ports: vec![PortDef::value_out("value", PortKind::Number)],
                description: None,
            },
            |_node, _inputs, _ctx, _output| Ok(Some(Value::Number(2.0))),
        );

        assert_eq!(registry.len(), 1);
        assert!(registry.definition("test/Two").is_some());
        assert!(registry.behavior("test/Two").is_some());
        assert!(registry.behavior("test/Three").is_none());
    }
}
