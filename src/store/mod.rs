//! Boundary to the remote document store.
//!
//! The store is assumed, not implemented: it holds schemaless JSON documents
//! in named collections (sub-collections are addressed by path, e.g.
//! `snippets/<id>/versions`), applies atomic single-document field updates,
//! and serves predicate-filtered subscriptions that deliver the complete
//! current result set on every change, never a delta.
//!
//! [`memory::InMemoryStore`] implements the same contract in-process for
//! tests and local development.

pub mod memory;

use serde_json::Value;

use crate::error::StoreError;

pub use memory::InMemoryStore;

/// A single relative or absolute field operation.
///
/// `Increment`, `ArrayUnion` and `ArrayRemove` are the commutative ones:
/// concurrent applications from different clients converge regardless of
/// arrival order, which is what keeps shared counters and member sets
/// correct without locking.
#[derive(Debug, Clone)]
pub enum FieldOp {
    Set(Value),
    Increment(i64),
    ArrayUnion(Value),
    ArrayRemove(Value),
}

/// An ordered batch of field operations applied atomically to one document.
#[derive(Debug, Clone, Default)]
pub struct Update {
    ops: Vec<(String, FieldOp)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: Value) -> Self {
        self.ops.push((field.to_string(), FieldOp::Set(value)));
        self
    }

    pub fn increment(mut self, field: &str, by: i64) -> Self {
        self.ops.push((field.to_string(), FieldOp::Increment(by)));
        self
    }

    /// Add `value` to the array field unless already present.
    pub fn array_union(mut self, field: &str, value: Value) -> Self {
        self.ops.push((field.to_string(), FieldOp::ArrayUnion(value)));
        self
    }

    /// Remove every occurrence of `value` from the array field.
    pub fn array_remove(mut self, field: &str, value: Value) -> Self {
        self.ops.push((field.to_string(), FieldOp::ArrayRemove(value)));
        self
    }

    pub fn ops(&self) -> &[(String, FieldOp)] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Conjunction of field-equality conditions, e.g.
/// `Predicate::field("ownerId", uid)` or
/// `Predicate::field("isPublic", true)`. An empty predicate matches every
/// document in the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<(String, Value)>,
}

impl Predicate {
    /// Matches the whole collection.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn field(name: &str, value: impl Into<Value>) -> Self {
        Self::any().and(name, value)
    }

    pub fn and(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((name.to_string(), value.into()));
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(name, expected)| document.get(name) == Some(expected))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Result ordering by a single field. Timestamps are RFC 3339 UTC strings
/// on the wire, so lexicographic string comparison orders them.
#[derive(Debug, Clone)]
pub struct SortOrder {
    pub field: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Descending,
        }
    }

    pub fn apply(&self, documents: &mut [Value]) {
        documents.sort_by(|a, b| {
            let ord = compare_values(a.get(&self.field), b.get(&self.field));
            match self.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// A live predicate-filtered subscription. Every emission on `receiver` is
/// the complete current result set.
pub struct Subscription {
    pub id: u64,
    pub receiver: flume::Receiver<Vec<Value>>,
}

/// Operations the remote document store is assumed to provide.
pub trait DocumentStore: Send + Sync {
    fn insert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Apply `update` atomically to one document. Fails with `NotFound` if
    /// the document vanished between read and mutate.
    fn update(&self, collection: &str, id: &str, update: Update) -> Result<(), StoreError>;

    /// Idempotent: deleting an already-deleted document succeeds.
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    fn query(
        &self,
        collection: &str,
        predicate: &Predicate,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Register a subscription. The current result set is delivered
    /// immediately; each later change to the collection delivers the full
    /// new result set.
    fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
        sort: Option<SortOrder>,
    ) -> Result<Subscription, StoreError>;

    /// Idempotent; unknown ids are ignored.
    fn unsubscribe(&self, subscription_id: u64);
}
