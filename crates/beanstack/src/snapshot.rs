//! Frozen, value-comparable state trees
//!
//! A [`Snapshot`] is built once from a plain [`serde_json::Value`] and never
//! changes afterwards. Nested maps and lists are wrapped recursively and shared
//! through `Arc`, so cloning a snapshot is cheap and no holder can reach into
//! another holder's tree. Changes always go through the reducer, which works on
//! a materialized copy (see [`Snapshot::to_value`]) and hands back a new tree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Immutable point-in-time representation of a state tree
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Snapshot {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    List(Arc<[Snapshot]>),
    Map(Arc<BTreeMap<String, Snapshot>>),
}

impl Snapshot {
    /// Value at `key` when this snapshot is a mapping
    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        match self {
            Snapshot::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Element at `index` when this snapshot is a list
    pub fn at(&self, index: usize) -> Option<&Snapshot> {
        match self {
            Snapshot::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Membership test for mapping keys
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys of a mapping in sorted order; empty for anything else
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let map = match self {
            Snapshot::Map(map) => Some(map.keys()),
            _ => None,
        };
        map.into_iter().flatten().map(String::as_str)
    }

    /// Elements of a list; empty for anything else
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        let items: &[Snapshot] = match self {
            Snapshot::List(items) => &items[..],
            _ => &[],
        };
        items.iter()
    }

    /// Number of entries in a mapping or list, zero for scalars
    pub fn len(&self) -> usize {
        match self {
            Snapshot::Map(map) => map.len(),
            Snapshot::List(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Snapshot::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Snapshot::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Snapshot::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Snapshot::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Snapshot::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Snapshot::String(s) => Some(&**s),
            _ => None,
        }
    }

    /// Materialize into a plain, independently owned value
    ///
    /// Mutating the result never affects this snapshot.
    pub fn to_value(&self) -> Value {
        match self {
            Snapshot::Null => Value::Null,
            Snapshot::Bool(b) => Value::Bool(*b),
            Snapshot::Number(n) => Value::Number(n.clone()),
            Snapshot::String(s) => Value::String(s.to_string()),
            Snapshot::List(items) => Value::Array(items.iter().map(Snapshot::to_value).collect()),
            Snapshot::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl From<Value> for Snapshot {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Snapshot::Null,
            Value::Bool(b) => Snapshot::Bool(b),
            Value::Number(n) => Snapshot::Number(n),
            Value::String(s) => Snapshot::String(Arc::from(s)),
            Value::Array(items) => Snapshot::List(items.into_iter().map(Snapshot::from).collect()),
            Value::Object(map) => Snapshot::Map(Arc::new(
                map.into_iter()
                    .map(|(key, value)| (key, Snapshot::from(value)))
                    .collect(),
            )),
        }
    }
}

impl From<&Value> for Snapshot {
    fn from(value: &Value) -> Self {
        Snapshot::from(value.clone())
    }
}

impl From<&Snapshot> for Value {
    fn from(snapshot: &Snapshot) -> Self {
        snapshot.to_value()
    }
}

impl From<Snapshot> for Value {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.to_value()
    }
}

// serde_json numbers compare by representation; -0.0 and 0.0 are equal and must hash alike
fn hash_number<H: Hasher>(n: &Number, state: &mut H) {
    if let Some(u) = n.as_u64() {
        0u8.hash(state);
        u.hash(state);
    } else if let Some(i) = n.as_i64() {
        1u8.hash(state);
        i.hash(state);
    } else {
        2u8.hash(state);
        let f = n.as_f64().unwrap_or_default();
        let f = if f == 0.0 { 0.0f64 } else { f };
        f.to_bits().hash(state);
    }
}

impl Eq for Snapshot {}

impl Hash for Snapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Snapshot::Null => {}
            Snapshot::Bool(b) => b.hash(state),
            Snapshot::Number(n) => hash_number(n, state),
            Snapshot::String(s) => s.hash(state),
            Snapshot::List(items) => items.hash(state),
            Snapshot::Map(map) => map.hash(state),
        }
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Snapshot::Null => serializer.serialize_unit(),
            Snapshot::Bool(b) => serializer.serialize_bool(*b),
            Snapshot::Number(n) => n.serialize(serializer),
            Snapshot::String(s) => serializer.serialize_str(s),
            Snapshot::List(items) => serializer.collect_seq(items.iter()),
            Snapshot::Map(map) => serializer.collect_map(map.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Snapshot::from)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
