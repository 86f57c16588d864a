//! End-to-end skill runs: an authored graph, a combat context, and a
//! host driving the run step by step.

use std::sync::Arc;

use serde_json::json;

use skillgraph_runtime::{
    CharacterId, InMemoryStats, NodeRegistry, RuntimeContext, Scheduler, StatAccess, StatValue,
};
use skillgraph_types::{Graph, PortRef};

/// "Desperate heal": when the unit drops below 25% HP at turn start,
/// restore 20 HP.
///
/// trigger/TurnStart --then--> flow/If --then--> effect/ModifyStat(+20 hp)
///                               ^condition
///                   logic/Compare(stat/Percent < 25)
fn desperate_heal(registry: &NodeRegistry) -> Arc<Graph> {
    let mut graph = Graph::new();

    let trigger = registry
        .spawn(&mut graph, "trigger/TurnStart", json!(null))
        .unwrap();
    let percent = registry
        .spawn(&mut graph, "stat/Percent", json!({"subject": "unit", "stat": "hp"}))
        .unwrap();
    let compare = registry
        .spawn(
            &mut graph,
            "logic/Compare",
            json!({"operator": "<", "defaults": {"b": 25.0}}),
        )
        .unwrap();
    let gate = registry.spawn(&mut graph, "flow/If", json!(null)).unwrap();
    let heal = registry
        .spawn(
            &mut graph,
            "effect/ModifyStat",
            json!({"subject": "unit", "stat": "hp", "defaults": {"amount": 20.0}}),
        )
        .unwrap();

    graph
        .connect(PortRef::new(percent, "percent"), PortRef::new(compare, "a"))
        .unwrap();
    graph
        .connect(PortRef::new(compare, "result"), PortRef::new(gate, "condition"))
        .unwrap();
    graph
        .connect(PortRef::new(trigger, "then"), PortRef::new(gate, "in"))
        .unwrap();
    graph
        .connect(PortRef::new(gate, "then"), PortRef::new(heal, "in"))
        .unwrap();

    Arc::new(graph)
}

fn combat_ctx(hp: f64) -> RuntimeContext {
    let hero = CharacterId(0);
    let mut stats = InMemoryStats::new();
    stats.insert(
        hero,
        "hp",
        StatValue {
            current: hp,
            max: 100.0,
            bonus: 0.0,
        },
    );
    RuntimeContext::new(hero, Box::new(stats))
}

/// Drive a run to completion the way an animation system would: keep
/// calling proceed until nothing is suspended.
fn drive(scheduler: &mut Scheduler, ctx: &mut RuntimeContext) {
    let mut current = scheduler.run(ctx);
    while current.is_some() {
        current = scheduler.proceed(ctx);
    }
}

#[test]
fn desperate_heal_fires_below_threshold() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let registry = Arc::new(NodeRegistry::with_builtins());
    let graph = desperate_heal(&registry);

    let mut ctx = combat_ctx(10.0);
    let mut scheduler = Scheduler::new(Arc::clone(&graph), Arc::clone(&registry));
    drive(&mut scheduler, &mut ctx);

    assert!(!ctx.is_interrupted());
    assert_eq!(ctx.stats().stat(CharacterId(0), "hp").unwrap().current, 30.0);
}

#[test]
fn desperate_heal_interrupts_above_threshold() {
    let registry = Arc::new(NodeRegistry::with_builtins());
    let graph = desperate_heal(&registry);

    let mut ctx = combat_ctx(80.0);
    let mut scheduler = Scheduler::new(Arc::clone(&graph), Arc::clone(&registry));
    drive(&mut scheduler, &mut ctx);

    // The condition was false, so the gate interrupted the run and the
    // heal never executed.
    assert!(ctx.is_interrupted());
    assert_eq!(ctx.stats().stat(CharacterId(0), "hp").unwrap().current, 80.0);
}

#[test]
fn suspension_is_externally_driven() {
    let registry = Arc::new(NodeRegistry::with_builtins());
    let graph = desperate_heal(&registry);

    let mut ctx = combat_ctx(10.0);
    let mut scheduler = Scheduler::new(Arc::clone(&graph), Arc::clone(&registry));

    // run executes only the trigger; the heal has not happened yet and
    // will not happen until the host proceeds twice more.
    scheduler.run(&mut ctx);
    assert_eq!(ctx.stats().stat(CharacterId(0), "hp").unwrap().current, 10.0);

    scheduler.proceed(&mut ctx); // gate
    assert_eq!(ctx.stats().stat(CharacterId(0), "hp").unwrap().current, 10.0);

    scheduler.proceed(&mut ctx); // heal
    assert_eq!(ctx.stats().stat(CharacterId(0), "hp").unwrap().current, 30.0);

    // At most one node is ever current, and a drained run proceeds to
    // nothing without complaint.
    assert_eq!(scheduler.proceed(&mut ctx), None);
    assert_eq!(scheduler.current_node(), None);
}

#[test]
fn same_graph_backs_concurrent_runs() {
    let registry = Arc::new(NodeRegistry::with_builtins());
    let graph = desperate_heal(&registry);

    // Two runs over the same shared graph, interleaved; each carries
    // its own scheduler and context, so neither observes the other.
    let mut wounded_ctx = combat_ctx(10.0);
    let mut healthy_ctx = combat_ctx(80.0);
    let mut wounded = Scheduler::new(Arc::clone(&graph), Arc::clone(&registry));
    let mut healthy = Scheduler::new(Arc::clone(&graph), Arc::clone(&registry));

    wounded.run(&mut wounded_ctx);
    healthy.run(&mut healthy_ctx);
    wounded.proceed(&mut wounded_ctx);
    healthy.proceed(&mut healthy_ctx);
    wounded.proceed(&mut wounded_ctx);
    healthy.proceed(&mut healthy_ctx);

    assert_eq!(
        wounded_ctx.stats().stat(CharacterId(0), "hp").unwrap().current,
        30.0
    );
    assert!(healthy_ctx.is_interrupted());
    assert_eq!(
        healthy_ctx.stats().stat(CharacterId(0), "hp").unwrap().current,
        80.0
    );
}

#[test]
fn observer_sees_every_executed_node() {
    use std::sync::Mutex;

    let registry = Arc::new(NodeRegistry::with_builtins());
    let graph = desperate_heal(&registry);

    let executed = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&executed);

    let mut ctx = combat_ctx(10.0);
    let mut scheduler = Scheduler::new(Arc::clone(&graph), Arc::clone(&registry));
    scheduler.on_node_executed(move |id| seen.lock().unwrap().push(id));
    drive(&mut scheduler, &mut ctx);

    // trigger, gate, heal: pure nodes are pulled, never stepped
    assert_eq!(executed.lock().unwrap().len(), 3);
}
