//! The character/stat boundary.
//!
//! The engine never sees stat storage layout: it reads and writes
//! through `StatAccess` only. The battle subsystem supplies the real
//! implementation; `InMemoryStats` is the stand-in for hosts and tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a character owned by the battle subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "char:{}", self.0)
    }
}

/// A snapshot of one stat on one character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatValue {
    pub current: f64,
    pub max: f64,
    pub bonus: f64,
}

/// Read/write access to character stats.
///
/// Implementations are expected to tolerate unknown characters and
/// stat ids: reads return `None`, writes are ignored.
pub trait StatAccess {
    /// Look up a stat on a character
    fn stat(&self, character: CharacterId, stat_id: &str) -> Option<StatValue>;

    /// Overwrite the current value of a stat
    fn set_current(&mut self, character: CharacterId, stat_id: &str, value: f64);
}

/// Simple map-backed stat store
#[derive(Debug, Default)]
pub struct InMemoryStats {
    stats: HashMap<(CharacterId, String), StatValue>,
}

impl InMemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stat at full health-style state (current == max)
    pub fn insert(&mut self, character: CharacterId, stat_id: &str, value: StatValue) {
        self.stats.insert((character, stat_id.to_string()), value);
    }
}

impl StatAccess for InMemoryStats {
    fn stat(&self, character: CharacterId, stat_id: &str) -> Option<StatValue> {
        self.stats.get(&(character, stat_id.to_string())).copied()
    }

    fn set_current(&mut self, character: CharacterId, stat_id: &str, value: f64) {
        if let Some(stat) = self.stats.get_mut(&(character, stat_id.to_string())) {
            stat.current = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let mut stats = InMemoryStats::new();
        let hero = CharacterId(1);
        stats.insert(
            hero,
            "hp",
            StatValue {
                current: 100.0,
                max: 100.0,
                bonus: 0.0,
            },
        );

        stats.set_current(hero, "hp", 40.0);
        assert_eq!(stats.stat(hero, "hp").unwrap().current, 40.0);
        assert_eq!(stats.stat(hero, "hp").unwrap().max, 100.0);

        // Unknown characters and stats read as absent, writes are ignored
        assert!(stats.stat(CharacterId(9), "hp").is_none());
        stats.set_current(hero, "mp", 5.0);
        assert!(stats.stat(hero, "mp").is_none());
    }
}
