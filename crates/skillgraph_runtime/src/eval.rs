//! Pull-based data evaluation.
//!
//! Resolving a value port walks the upstream chain on demand, every
//! time. Nothing is memoized within or across calls: node configuration
//! and stat values change between turns, so a cached value would go
//! stale. Evaluation never mutates runtime state and never suspends.
//!
//! A visited stack guards against accidental cycles in the value
//! subgraph; re-entering a node that is still being evaluated fails the
//! single call with `EvalError::CyclicDataDependency` instead of
//! overflowing the stack.

use tracing::warn;

use skillgraph_types::{Graph, NodeId, PortDef, PortDirection, SkillNode, Value};

use crate::context::RuntimeContext;
use crate::error::EvalError;
use crate::registry::{NodeBehavior, NodeRegistry, PortValues};

/// One pull-evaluation pass over a graph.
///
/// Cheap to construct; the scheduler builds a fresh one per node step
/// and hosts build one per query.
pub struct Evaluator<'g> {
    graph: &'g Graph,
    registry: &'g NodeRegistry,
    in_flight: Vec<NodeId>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g Graph, registry: &'g NodeRegistry) -> Self {
        Self {
            graph,
            registry,
            in_flight: Vec::new(),
        }
    }

    /// Resolve an output value port to a concrete value.
    ///
    /// Recursively resolves the node's own value inputs first, then
    /// invokes the node's value body. A body that produces no value
    /// falls back to the port's literal default, then the kind's zero
    /// value.
    pub fn output(
        &mut self,
        ctx: &RuntimeContext,
        node: NodeId,
        port: &str,
    ) -> Result<Value, EvalError> {
        if self.in_flight.contains(&node) {
            return Err(EvalError::CyclicDataDependency { node });
        }

        let node_ref = self.graph.node(node).ok_or(EvalError::UnknownNode(node))?;
        let port_def = node_ref
            .port(port)
            .filter(|p| p.direction == PortDirection::Output && p.is_value())
            .ok_or_else(|| EvalError::UnknownPort {
                node,
                port: port.to_string(),
            })?;
        let behavior = self
            .registry
            .behavior(&node_ref.kind)
            .ok_or_else(|| EvalError::UnknownKind(node_ref.kind.clone()))?;

        self.in_flight.push(node);
        let resolved = self
            .gather_inputs(ctx, node_ref)
            .and_then(|inputs| {
                behavior
                    .evaluate(node_ref, &inputs, ctx, port)
                    .map_err(|fault| EvalError::NodeFailed {
                        node,
                        kind: node_ref.kind.clone(),
                        fault,
                    })
            });
        self.in_flight.pop();

        match resolved? {
            Some(value) => Ok(value),
            None => Ok(literal_fallback(port_def)),
        }
    }

    /// Resolve an input value port: a live incoming connection pulls
    /// the upstream output; otherwise the node-config `defaults`
    /// object, then the port's literal default, then the kind's zero
    /// value.
    pub fn input(
        &mut self,
        ctx: &RuntimeContext,
        node: NodeId,
        port: &str,
    ) -> Result<Value, EvalError> {
        let node_ref = self.graph.node(node).ok_or(EvalError::UnknownNode(node))?;
        let port_def = node_ref
            .port(port)
            .filter(|p| p.direction == PortDirection::Input && p.is_value())
            .ok_or_else(|| EvalError::UnknownPort {
                node,
                port: port.to_string(),
            })?;

        if let Some(conn) = self.graph.incoming(node, port) {
            let from = conn.from.clone();
            return self.output(ctx, from.node, &from.port);
        }

        if let Some(json) = node_ref
            .config
            .get("defaults")
            .and_then(|defaults| defaults.get(port))
        {
            match Value::from_json(port_def.kind, json) {
                Some(value) => return Ok(value),
                None => warn!(
                    node_id = %node,
                    port = port,
                    "config default does not fit the port kind, ignoring"
                ),
            }
        }

        Ok(literal_fallback(port_def))
    }

    /// Resolve every value input of a node into one snapshot
    pub fn gather_inputs(
        &mut self,
        ctx: &RuntimeContext,
        node: &SkillNode,
    ) -> Result<PortValues, EvalError> {
        let ports: Vec<String> = node.value_inputs().map(|p| p.name.clone()).collect();
        let mut inputs = PortValues::new();
        for port in ports {
            let value = self.input(ctx, node.id, &port)?;
            inputs.insert(&port, value);
        }
        Ok(inputs)
    }
}

/// The value an unconnected, body-less value port resolves to
fn literal_fallback(port: &PortDef) -> Value {
    port.default
        .clone()
        .or_else(|| port.kind.zero_value())
        .unwrap_or(Value::Boolean(false))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skillgraph_types::{NodeDef, PortKind, PortRef};

    use crate::stats::{CharacterId, InMemoryStats};

    /// constant: emits config "value" on its "value" output
    /// echo: evaluates its "amount" input onto its "echo" output
    fn test_registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register_pure(
            NodeDef {
                id: "test/Constant".to_string(),
                name: "Constant".to_string(),
                category: "Test".to_string(),
                ports: vec![PortDef::value_out("value", PortKind::Number)],
                description: None,
            },
            |node, _inputs, _ctx, _output| {
                Ok(node.config_number("value").map(Value::Number))
            },
        );
        registry.register_pure(
            NodeDef {
                id: "test/Echo".to_string(),
                name: "Echo".to_string(),
                category: "Test".to_string(),
                ports: vec![
                    PortDef::value_in_with_default("amount", PortKind::Number, Value::Number(5.0)),
                    PortDef::value_out("echo", PortKind::Number),
                ],
                description: None,
            },
            |_node, inputs, _ctx, _output| {
                Ok(inputs.number("amount").map(Value::Number))
            },
        );
        registry
    }

    fn ctx() -> RuntimeContext {
        RuntimeContext::new(CharacterId(0), Box::new(InMemoryStats::new()))
    }

    #[test]
    fn test_literal_fallback_then_connection_wins() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let echo = registry.spawn(&mut graph, "test/Echo", json!(null)).unwrap();
        let constant = registry
            .spawn(&mut graph, "test/Constant", json!({"value": 7.0}))
            .unwrap();

        let ctx = ctx();

        // Unconnected input resolves to the port's literal default
        let value = Evaluator::new(&graph, &registry)
            .output(&ctx, echo, "echo")
            .unwrap();
        assert_eq!(value, Value::Number(5.0));

        graph
            .connect(PortRef::new(constant, "value"), PortRef::new(echo, "amount"))
            .unwrap();
        let value = Evaluator::new(&graph, &registry)
            .output(&ctx, echo, "echo")
            .unwrap();
        assert_eq!(value, Value::Number(7.0));
    }

    #[test]
    fn test_evaluation_is_uncached() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let echo = registry.spawn(&mut graph, "test/Echo", json!(null)).unwrap();
        let constant = registry
            .spawn(&mut graph, "test/Constant", json!({"value": 7.0}))
            .unwrap();
        graph
            .connect(PortRef::new(constant, "value"), PortRef::new(echo, "amount"))
            .unwrap();

        let ctx = ctx();
        let first = Evaluator::new(&graph, &registry)
            .output(&ctx, echo, "echo")
            .unwrap();
        assert_eq!(first, Value::Number(7.0));

        // Reconfiguring the upstream constant changes the very next
        // evaluation: nothing was memoized.
        graph.node_mut(constant).unwrap().config = json!({"value": 8.5});
        let second = Evaluator::new(&graph, &registry)
            .output(&ctx, echo, "echo")
            .unwrap();
        assert_eq!(second, Value::Number(8.5));
    }

    #[test]
    fn test_config_defaults_override_port_default() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let echo = registry
            .spawn(&mut graph, "test/Echo", json!({"defaults": {"amount": 11.0}}))
            .unwrap();

        let ctx = ctx();
        let value = Evaluator::new(&graph, &registry)
            .output(&ctx, echo, "echo")
            .unwrap();
        assert_eq!(value, Value::Number(11.0));
    }

    #[test]
    fn test_data_cycle_fails_cleanly() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = registry.spawn(&mut graph, "test/Echo", json!(null)).unwrap();
        let b = registry.spawn(&mut graph, "test/Echo", json!(null)).unwrap();
        graph
            .connect(PortRef::new(a, "echo"), PortRef::new(b, "amount"))
            .unwrap();
        graph
            .connect(PortRef::new(b, "echo"), PortRef::new(a, "amount"))
            .unwrap();

        let ctx = ctx();
        let err = Evaluator::new(&graph, &registry)
            .output(&ctx, a, "echo")
            .unwrap_err();
        assert!(matches!(err, EvalError::CyclicDataDependency { node } if node == a));
    }

    #[test]
    fn test_unknown_port_is_an_error() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let echo = registry.spawn(&mut graph, "test/Echo", json!(null)).unwrap();

        let ctx = ctx();
        let err = Evaluator::new(&graph, &registry)
            .output(&ctx, echo, "nope")
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownPort { .. }));

        // Input ports are not output ports
        let err = Evaluator::new(&graph, &registry)
            .output(&ctx, echo, "amount")
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownPort { .. }));
    }
}
