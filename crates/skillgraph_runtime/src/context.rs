//! Per-run mutable state.
//!
//! One `RuntimeContext` exists per skill invocation. The battle
//! subsystem builds it (actor, targets, allies, adjacency) before the
//! run starts; it is exclusively owned by that run and discarded with
//! the scheduler when the run ends or is abandoned. It is passed
//! explicitly into every node call, so nodes never reach backward into
//! scheduler internals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use skillgraph_types::Value;

use crate::stats::{CharacterId, StatAccess};

// ─────────────────────────────────────────────────────────────────────────────
// Adjacency
// ─────────────────────────────────────────────────────────────────────────────

/// The eight grid directions around the invoking actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];
}

/// Pre-computed 8-direction neighborhood of the invoking actor.
///
/// Built by the battle subsystem before the run; the engine never
/// computes adjacency itself.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AdjacencySnapshot {
    slots: [Option<CharacterId>; 8],
}

impl AdjacencySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Place a character in one direction slot
    pub fn set(&mut self, direction: Direction, character: CharacterId) {
        self.slots[direction as usize] = Some(character);
    }

    /// The character adjacent in a direction, if any
    pub fn get(&self, direction: Direction) -> Option<CharacterId> {
        self.slots[direction as usize]
    }

    /// Number of occupied neighbor slots
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subject Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Which character a node reads or mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The invoking actor
    Actor,
    /// The first enemy target
    FirstTarget,
    /// The first ally
    FirstAlly,
}

impl Subject {
    /// Parse the authoring-side subject keyword. Unknown keywords fall
    /// back to the actor with a warning.
    pub fn from_config(keyword: Option<&str>) -> Subject {
        match keyword {
            None | Some("unit") => Subject::Actor,
            Some("enemy") => Subject::FirstTarget,
            Some("ally") => Subject::FirstAlly,
            Some(other) => {
                warn!(subject = other, "unknown subject keyword, using unit");
                Subject::Actor
            }
        }
    }

    /// Resolve to a concrete character in the given context.
    ///
    /// An empty target/ally list resolves to `None`; the querying node
    /// must fall back to its literal default rather than fail the run.
    pub fn resolve(&self, ctx: &RuntimeContext) -> Option<CharacterId> {
        match self {
            Subject::Actor => Some(ctx.actor),
            Subject::FirstTarget => ctx.targets.first().copied(),
            Subject::FirstAlly => ctx.allies.first().copied(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime Context
// ─────────────────────────────────────────────────────────────────────────────

/// The mutable state bag threaded through one execution run
pub struct RuntimeContext {
    /// The invoking actor
    pub actor: CharacterId,
    /// Enemy targets of the skill, in battle order
    pub targets: Vec<CharacterId>,
    /// Allies of the actor, in battle order
    pub allies: Vec<CharacterId>,
    /// Neighborhood of the actor at invocation time
    pub adjacency: AdjacencySnapshot,
    /// Set once to halt all further traversal; never cleared mid-run
    interrupted: bool,
    /// Open-ended store for node bookkeeping (flags, counters)
    store: HashMap<String, Value>,
    /// Character/stat boundary supplied by the battle subsystem
    stats: Box<dyn StatAccess>,
}

impl RuntimeContext {
    /// Create a context for a fresh run
    pub fn new(actor: CharacterId, stats: Box<dyn StatAccess>) -> Self {
        Self {
            actor,
            targets: Vec::new(),
            allies: Vec::new(),
            adjacency: AdjacencySnapshot::empty(),
            interrupted: false,
            store: HashMap::new(),
            stats,
        }
    }

    /// Set the enemy targets
    pub fn with_targets(mut self, targets: Vec<CharacterId>) -> Self {
        self.targets = targets;
        self
    }

    /// Set the allies
    pub fn with_allies(mut self, allies: Vec<CharacterId>) -> Self {
        self.allies = allies;
        self
    }

    /// Set the adjacency snapshot
    pub fn with_adjacency(mut self, adjacency: AdjacencySnapshot) -> Self {
        self.adjacency = adjacency;
        self
    }

    /// Halt all further traversal of this run
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Check whether the run has been interrupted
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Read a value from the run-scoped store
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    /// Write a value into the run-scoped store
    pub fn set_value(&mut self, key: &str, value: Value) {
        self.store.insert(key.to_string(), value);
    }

    /// Read-only stat access
    pub fn stats(&self) -> &dyn StatAccess {
        self.stats.as_ref()
    }

    /// Mutable stat access (effect nodes)
    pub fn stats_mut(&mut self) -> &mut dyn StatAccess {
        self.stats.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::InMemoryStats;

    fn ctx() -> RuntimeContext {
        RuntimeContext::new(CharacterId(0), Box::new(InMemoryStats::new()))
            .with_targets(vec![CharacterId(1), CharacterId(2)])
            .with_allies(vec![CharacterId(3)])
    }

    #[test]
    fn test_subject_resolution() {
        let ctx = ctx();
        assert_eq!(Subject::Actor.resolve(&ctx), Some(CharacterId(0)));
        assert_eq!(Subject::FirstTarget.resolve(&ctx), Some(CharacterId(1)));
        assert_eq!(Subject::FirstAlly.resolve(&ctx), Some(CharacterId(3)));

        let lonely = RuntimeContext::new(CharacterId(0), Box::new(InMemoryStats::new()));
        assert_eq!(Subject::FirstTarget.resolve(&lonely), None);
        assert_eq!(Subject::FirstAlly.resolve(&lonely), None);
    }

    #[test]
    fn test_subject_keywords() {
        assert_eq!(Subject::from_config(Some("unit")), Subject::Actor);
        assert_eq!(Subject::from_config(Some("enemy")), Subject::FirstTarget);
        assert_eq!(Subject::from_config(Some("ally")), Subject::FirstAlly);
        assert_eq!(Subject::from_config(None), Subject::Actor);
        assert_eq!(Subject::from_config(Some("???")), Subject::Actor);
    }

    #[test]
    fn test_adjacency_snapshot() {
        let mut adjacency = AdjacencySnapshot::empty();
        assert_eq!(adjacency.occupied_count(), 0);

        adjacency.set(Direction::North, CharacterId(7));
        adjacency.set(Direction::SouthWest, CharacterId(8));
        assert_eq!(adjacency.get(Direction::North), Some(CharacterId(7)));
        assert_eq!(adjacency.get(Direction::East), None);
        assert_eq!(adjacency.occupied_count(), 2);
    }

    #[test]
    fn test_store_round_trip() {
        let mut ctx = ctx();
        assert!(ctx.value("used_counter").is_none());
        ctx.set_value("used_counter", Value::Number(1.0));
        assert_eq!(ctx.value("used_counter"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_interrupt_is_sticky() {
        let mut ctx = ctx();
        assert!(!ctx.is_interrupted());
        ctx.interrupt();
        assert!(ctx.is_interrupted());
    }
}
