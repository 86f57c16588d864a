//! Built-in node catalog.
//!
//! Three families share the behavior contract: triggers (entry points,
//! no bodies), pure nodes (value bodies only), and flow/effect nodes
//! (effect bodies only). The game-specific math inside bodies is
//! authored data as far as the engine is concerned; anything here can
//! be replaced or extended by registering other kinds.

use tracing::{debug, warn};

use skillgraph_types::{NodeDef, PortDef, PortKind, SkillNode, Value};

use crate::context::{RuntimeContext, Subject};
use crate::registry::{NodeRegistry, NoopBehavior};
use crate::stats::{CharacterId, StatAccess};

/// Register the whole built-in catalog
pub fn register_builtin_nodes(registry: &mut NodeRegistry) {
    register_trigger_nodes(registry);
    register_literal_nodes(registry);
    register_math_nodes(registry);
    register_logic_nodes(registry);
    register_stat_nodes(registry);
    register_env_nodes(registry);
    register_flow_nodes(registry);
    register_effect_nodes(registry);

    debug!("registered {} built-in node kinds", registry.len());
}

// ─────────────────────────────────────────────────────────────────────────────
// Triggers
// ─────────────────────────────────────────────────────────────────────────────

fn register_trigger_nodes(registry: &mut NodeRegistry) {
    // Which battle event maps to which trigger is the authoring
    // surface's concern; the engine only cares that these are entry
    // points with no bodies.
    for (id, name, description) in [
        ("trigger/TurnStart", "On Turn Start", "Fires when the unit's turn begins"),
        ("trigger/UnitAttacks", "On Unit Attacks", "Fires when the unit attacks"),
        ("trigger/EnemyDefeated", "On Enemy Defeated", "Fires when the unit defeats an enemy"),
    ] {
        registry.register(
            NodeDef {
                id: id.to_string(),
                name: name.to_string(),
                category: "Trigger".to_string(),
                ports: vec![PortDef::signal_out("then")],
                description: Some(description.to_string()),
            },
            std::sync::Arc::new(NoopBehavior),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────────────

fn register_literal_nodes(registry: &mut NodeRegistry) {
    registry.register_pure(
        NodeDef {
            id: "literal/Number".to_string(),
            name: "Number".to_string(),
            category: "Literal".to_string(),
            ports: vec![PortDef::value_out("value", PortKind::Number)],
            description: Some("A constant number from config.value".to_string()),
        },
        |node, _inputs, _ctx, _output| Ok(node.config_number("value").map(Value::Number)),
    );

    registry.register_pure(
        NodeDef {
            id: "literal/Boolean".to_string(),
            name: "Boolean".to_string(),
            category: "Literal".to_string(),
            ports: vec![PortDef::value_out("value", PortKind::Boolean)],
            description: Some("A constant boolean from config.value".to_string()),
        },
        |node, _inputs, _ctx, _output| {
            Ok(node
                .config
                .get("value")
                .and_then(|v| v.as_bool())
                .map(Value::Boolean))
        },
    );

    registry.register_pure(
        NodeDef {
            id: "literal/Text".to_string(),
            name: "Text".to_string(),
            category: "Literal".to_string(),
            ports: vec![PortDef::value_out("value", PortKind::Text)],
            description: Some("A constant text from config.value".to_string()),
        },
        |node, _inputs, _ctx, _output| {
            Ok(node.config_str("value").map(|s| Value::Text(s.to_string())))
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Math
// ─────────────────────────────────────────────────────────────────────────────

fn math_def(id: &str, name: &str, description: &str) -> NodeDef {
    NodeDef {
        id: id.to_string(),
        name: name.to_string(),
        category: "Math".to_string(),
        ports: vec![
            PortDef::value_in_with_default("a", PortKind::Number, Value::Number(0.0)),
            PortDef::value_in_with_default("b", PortKind::Number, Value::Number(0.0)),
            PortDef::value_out("result", PortKind::Number),
        ],
        description: Some(description.to_string()),
    }
}

fn register_math_nodes(registry: &mut NodeRegistry) {
    registry.register_pure(
        math_def("math/Add", "Add", "Add two numbers"),
        |_node, inputs, _ctx, _output| {
            let a = inputs.number("a").unwrap_or(0.0);
            let b = inputs.number("b").unwrap_or(0.0);
            Ok(Some(Value::Number(a + b)))
        },
    );

    registry.register_pure(
        math_def("math/Subtract", "Subtract", "Subtract b from a"),
        |_node, inputs, _ctx, _output| {
            let a = inputs.number("a").unwrap_or(0.0);
            let b = inputs.number("b").unwrap_or(0.0);
            Ok(Some(Value::Number(a - b)))
        },
    );

    registry.register_pure(
        math_def("math/Multiply", "Multiply", "Multiply two numbers"),
        |_node, inputs, _ctx, _output| {
            let a = inputs.number("a").unwrap_or(0.0);
            let b = inputs.number("b").unwrap_or(0.0);
            Ok(Some(Value::Number(a * b)))
        },
    );

    registry.register_pure(
        math_def("math/Divide", "Divide", "Divide a by b (0 when b is 0)"),
        |_node, inputs, _ctx, _output| {
            let a = inputs.number("a").unwrap_or(0.0);
            let b = inputs.number("b").unwrap_or(1.0);
            let result = if b != 0.0 { a / b } else { 0.0 };
            Ok(Some(Value::Number(result)))
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Logic
// ─────────────────────────────────────────────────────────────────────────────

fn register_logic_nodes(registry: &mut NodeRegistry) {
    let bool_pair = |id: &str, name: &str| NodeDef {
        id: id.to_string(),
        name: name.to_string(),
        category: "Logic".to_string(),
        ports: vec![
            PortDef::value_in_with_default("a", PortKind::Boolean, Value::Boolean(false)),
            PortDef::value_in_with_default("b", PortKind::Boolean, Value::Boolean(false)),
            PortDef::value_out("result", PortKind::Boolean),
        ],
        description: None,
    };

    registry.register_pure(bool_pair("logic/And", "AND"), |_node, inputs, _ctx, _output| {
        let a = inputs.boolean("a").unwrap_or(false);
        let b = inputs.boolean("b").unwrap_or(false);
        Ok(Some(Value::Boolean(a && b)))
    });

    registry.register_pure(bool_pair("logic/Or", "OR"), |_node, inputs, _ctx, _output| {
        let a = inputs.boolean("a").unwrap_or(false);
        let b = inputs.boolean("b").unwrap_or(false);
        Ok(Some(Value::Boolean(a || b)))
    });

    registry.register_pure(
        NodeDef {
            id: "logic/Not".to_string(),
            name: "NOT".to_string(),
            category: "Logic".to_string(),
            ports: vec![
                PortDef::value_in_with_default("a", PortKind::Boolean, Value::Boolean(false)),
                PortDef::value_out("result", PortKind::Boolean),
            ],
            description: None,
        },
        |_node, inputs, _ctx, _output| {
            Ok(Some(Value::Boolean(!inputs.boolean("a").unwrap_or(false))))
        },
    );

    registry.register_pure(
        NodeDef {
            id: "logic/Compare".to_string(),
            name: "Compare".to_string(),
            category: "Logic".to_string(),
            ports: vec![
                PortDef::value_in_with_default("a", PortKind::Number, Value::Number(0.0)),
                PortDef::value_in_with_default("b", PortKind::Number, Value::Number(0.0)),
                PortDef::value_out("result", PortKind::Boolean),
            ],
            description: Some("Compare two numbers. Operator via config.operator".to_string()),
        },
        |node, inputs, _ctx, _output| {
            let a = inputs.number("a").unwrap_or(0.0);
            let b = inputs.number("b").unwrap_or(0.0);
            let operator = node.config_str("operator").unwrap_or("==");
            let result = match operator {
                "==" => a == b,
                "!=" => a != b,
                "<" => a < b,
                "<=" => a <= b,
                ">" => a > b,
                ">=" => a >= b,
                other => {
                    warn!(operator = other, "unknown comparison operator");
                    false
                }
            };
            Ok(Some(Value::Boolean(result)))
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Stat Queries
// ─────────────────────────────────────────────────────────────────────────────

fn stat_subject(node: &SkillNode, ctx: &RuntimeContext) -> Option<CharacterId> {
    let subject = Subject::from_config(node.config_str("subject"));
    let resolved = subject.resolve(ctx);
    if resolved.is_none() {
        warn!(
            node_id = %node.id,
            kind = %node.kind,
            "subject resolved to no character, using literal default"
        );
    }
    resolved
}

fn register_stat_nodes(registry: &mut NodeRegistry) {
    registry.register_pure(
        NodeDef {
            id: "stat/Value".to_string(),
            name: "Stat Value".to_string(),
            category: "Stat".to_string(),
            ports: vec![
                PortDef::value_out("current", PortKind::Number),
                PortDef::value_out("max", PortKind::Number),
                PortDef::value_out("bonus", PortKind::Number),
            ],
            description: Some(
                "Read a stat on the configured subject (config.subject, config.stat)".to_string(),
            ),
        },
        |node, _inputs, ctx, output| {
            let stat_id = node.config_str("stat").unwrap_or("hp");
            let fallback = node.config_number("default").map(Value::Number);

            let Some(character) = stat_subject(node, ctx) else {
                return Ok(fallback);
            };
            let Some(stat) = ctx.stats().stat(character, stat_id) else {
                warn!(
                    node_id = %node.id,
                    character = %character,
                    stat = stat_id,
                    "character has no such stat, using literal default"
                );
                return Ok(fallback);
            };

            let value = match output {
                "current" => stat.current,
                "max" => stat.max,
                "bonus" => stat.bonus,
                _ => return Ok(None),
            };
            Ok(Some(Value::Number(value)))
        },
    );

    registry.register_pure(
        NodeDef {
            id: "stat/Percent".to_string(),
            name: "Stat Percent".to_string(),
            category: "Stat".to_string(),
            ports: vec![PortDef::value_out("percent", PortKind::Number)],
            description: Some("Current/max of a stat as 0..100".to_string()),
        },
        |node, _inputs, ctx, _output| {
            let stat_id = node.config_str("stat").unwrap_or("hp");
            let fallback = node.config_number("default").map(Value::Number);

            let Some(character) = stat_subject(node, ctx) else {
                return Ok(fallback);
            };
            let Some(stat) = ctx.stats().stat(character, stat_id) else {
                return Ok(fallback);
            };

            let percent = if stat.max > 0.0 {
                stat.current / stat.max * 100.0
            } else {
                0.0
            };
            Ok(Some(Value::Number(percent)))
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment Queries
// ─────────────────────────────────────────────────────────────────────────────

fn register_env_nodes(registry: &mut NodeRegistry) {
    registry.register_pure(
        NodeDef {
            id: "env/AdjacentCount".to_string(),
            name: "Adjacent Count".to_string(),
            category: "Environment".to_string(),
            ports: vec![PortDef::value_out("count", PortKind::Number)],
            description: Some("Number of occupied squares around the unit".to_string()),
        },
        |_node, _inputs, ctx, _output| {
            Ok(Some(Value::Number(ctx.adjacency.occupied_count() as f64)))
        },
    );

    registry.register_pure(
        NodeDef {
            id: "env/TargetCount".to_string(),
            name: "Target Count".to_string(),
            category: "Environment".to_string(),
            ports: vec![PortDef::value_out("count", PortKind::Number)],
            description: Some("Number of enemy targets of this invocation".to_string()),
        },
        |_node, _inputs, ctx, _output| Ok(Some(Value::Number(ctx.targets.len() as f64))),
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Flow
// ─────────────────────────────────────────────────────────────────────────────

fn register_flow_nodes(registry: &mut NodeRegistry) {
    registry.register_effect(
        NodeDef {
            id: "flow/If".to_string(),
            name: "If".to_string(),
            category: "Flow".to_string(),
            ports: vec![
                PortDef::signal_in(),
                PortDef::value_in_with_default("condition", PortKind::Boolean, Value::Boolean(true)),
                PortDef::signal_out("then"),
            ],
            description: Some(
                "Interrupts the run when the condition is false; there is no false branch"
                    .to_string(),
            ),
        },
        |node, inputs, ctx| {
            let condition = inputs.boolean("condition").unwrap_or(false);
            if !condition {
                debug!(node_id = %node.id, "condition false, interrupting run");
                ctx.interrupt();
            }
            Ok(())
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Effects
// ─────────────────────────────────────────────────────────────────────────────

/// All characters an effect applies to: the resolved subject, or the
/// whole subject family when the "all" flag is set.
fn effect_subjects(node: &SkillNode, all: bool, ctx: &RuntimeContext) -> Vec<CharacterId> {
    let subject = Subject::from_config(node.config_str("subject"));
    if all {
        match subject {
            Subject::Actor => vec![ctx.actor],
            Subject::FirstTarget => ctx.targets.clone(),
            Subject::FirstAlly => ctx.allies.clone(),
        }
    } else {
        subject.resolve(ctx).into_iter().collect()
    }
}

fn register_effect_nodes(registry: &mut NodeRegistry) {
    registry.register_effect(
        NodeDef {
            id: "effect/ModifyStat".to_string(),
            name: "Modify Stat".to_string(),
            category: "Effect".to_string(),
            ports: vec![
                PortDef::signal_in(),
                PortDef::value_in_with_default("amount", PortKind::Number, Value::Number(0.0)),
                PortDef::value_in_with_default("all", PortKind::Boolean, Value::Boolean(false)),
                PortDef::signal_out("then"),
            ],
            description: Some(
                "Add to (or set, config.op) a stat on the configured subject; \
                 the all flag covers every character of the subject family"
                    .to_string(),
            ),
        },
        |node, inputs, ctx| {
            let stat_id = node.config_str("stat").unwrap_or("hp").to_string();
            let set = node.config_str("op") == Some("set");
            let amount = inputs.number("amount").unwrap_or(0.0);
            let all = inputs.boolean("all").unwrap_or(false);

            let characters = effect_subjects(node, all, ctx);
            if characters.is_empty() {
                warn!(
                    node_id = %node.id,
                    "subject resolved to no character, effect skipped"
                );
                return Ok(());
            }

            for character in characters {
                let Some(stat) = ctx.stats().stat(character, &stat_id) else {
                    warn!(
                        node_id = %node.id,
                        character = %character,
                        stat = %stat_id,
                        "character has no such stat, effect skipped"
                    );
                    continue;
                };
                let target = if set { amount } else { stat.current + amount };
                let clamped = target.clamp(0.0, stat.max);
                ctx.stats_mut().set_current(character, &stat_id, clamped);
            }
            Ok(())
        },
    );

    registry.register_effect(
        NodeDef {
            id: "effect/SetFlag".to_string(),
            name: "Set Flag".to_string(),
            category: "Effect".to_string(),
            ports: vec![
                PortDef::signal_in(),
                PortDef::value_in_with_default("value", PortKind::Boolean, Value::Boolean(true)),
                PortDef::signal_out("then"),
            ],
            description: Some("Write a boolean into the run's store (config.key)".to_string()),
        },
        |node, inputs, ctx| {
            let key = node.config_str("key").unwrap_or("flag").to_string();
            let value = inputs.boolean("value").unwrap_or(true);
            ctx.set_value(&key, Value::Boolean(value));
            Ok(())
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
