//! Port kinds and the tagged value type carried on value ports.
//!
//! Signal ports carry no data, so `Value` only covers the three data
//! kinds. Every data kind has a zero value used as the last-resort
//! fallback when a port has neither a connection nor a literal default.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Port Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The kind of value a port carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// Control flow (no data, just "proceed from here")
    Signal,
    /// Boolean value
    Boolean,
    /// 64-bit floating point
    Number,
    /// UTF-8 string
    Text,
}

impl PortKind {
    /// Check if this kind can legally connect to another.
    ///
    /// Connections require identical kinds on both endpoints.
    pub fn is_compatible_with(&self, other: &PortKind) -> bool {
        self == other
    }

    /// Check if this is the control-flow kind
    pub fn is_signal(&self) -> bool {
        matches!(self, PortKind::Signal)
    }

    /// Check if this is a data-carrying kind
    pub fn is_value(&self) -> bool {
        !self.is_signal()
    }

    /// The zero value for a data kind. Signal ports carry nothing.
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            PortKind::Signal => None,
            PortKind::Boolean => Some(Value::Boolean(false)),
            PortKind::Number => Some(Value::Number(0.0)),
            PortKind::Text => Some(Value::Text(String::new())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Values
// ─────────────────────────────────────────────────────────────────────────────

/// A concrete value flowing through a value port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Boolean value
    Boolean(bool),
    /// 64-bit floating point
    Number(f64),
    /// UTF-8 string
    Text(String),
}

impl Value {
    /// The port kind this value belongs on
    pub fn kind(&self) -> PortKind {
        match self {
            Value::Boolean(_) => PortKind::Boolean,
            Value::Number(_) => PortKind::Number,
            Value::Text(_) => PortKind::Text,
        }
    }

    /// Get as boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert a JSON literal (node config) into a port value of the
    /// given kind. Returns `None` when the JSON does not fit the kind.
    pub fn from_json(kind: PortKind, json: &serde_json::Value) -> Option<Value> {
        match kind {
            PortKind::Signal => None,
            PortKind::Boolean => json.as_bool().map(Value::Boolean),
            PortKind::Number => json.as_f64().map(Value::Number),
            PortKind::Text => json.as_str().map(|s| Value::Text(s.to_string())),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_compatibility() {
        assert!(PortKind::Number.is_compatible_with(&PortKind::Number));
        assert!(PortKind::Signal.is_compatible_with(&PortKind::Signal));
        assert!(!PortKind::Boolean.is_compatible_with(&PortKind::Number));
        assert!(!PortKind::Signal.is_compatible_with(&PortKind::Text));
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(PortKind::Signal.zero_value(), None);
        assert_eq!(PortKind::Boolean.zero_value(), Some(Value::Boolean(false)));
        assert_eq!(PortKind::Number.zero_value(), Some(Value::Number(0.0)));
        assert_eq!(PortKind::Text.zero_value(), Some(Value::Text(String::new())));
    }

    #[test]
    fn test_from_json_literal() {
        let json = serde_json::json!(5.0);
        assert_eq!(
            Value::from_json(PortKind::Number, &json),
            Some(Value::Number(5.0))
        );
        // Kind mismatch yields nothing rather than a coercion
        assert_eq!(Value::from_json(PortKind::Boolean, &json), None);
    }

    #[test]
    fn test_value_kind_round_trip() {
        assert_eq!(Value::Boolean(true).kind(), PortKind::Boolean);
        assert_eq!(Value::Number(1.5).kind(), PortKind::Number);
        assert_eq!(Value::Text("hp".into()).kind(), PortKind::Text);
    }
}
