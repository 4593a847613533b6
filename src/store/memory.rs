use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use super::{DocumentStore, FieldOp, Predicate, SortOrder, Subscription, Update};
use crate::error::StoreError;

/// In-process document store used by tests and local development.
///
/// Clone-friendly: clones share the same underlying storage. Subscribers get
/// the complete filtered result set re-delivered after every mutation of
/// their collection, mirroring the remote store's contract.
///
/// `set_offline(true)` simulates a transport outage: mutations fail with
/// `Unavailable` and subscribers simply stop hearing anything new, so
/// mirrors keep serving their last snapshot.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscription: AtomicU64,
    offline: AtomicBool,
}

struct Subscriber {
    id: u64,
    collection: String,
    predicate: Predicate,
    sort: Option<SortOrder>,
    sender: flume::Sender<Vec<Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn fail_if_offline(&self) -> Result<(), StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        Ok(())
    }

    fn collection_snapshot(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Re-deliver the full filtered result set to every subscriber of
    /// `collection`, dropping subscribers whose receiver is gone.
    fn notify(&self, collection: &str) {
        let documents = match self.collection_snapshot(collection) {
            Ok(documents) => documents,
            Err(err) => {
                warn!(collection, %err, "skipping subscriber notification");
                return;
            }
        };
        let Ok(mut subscribers) = self.inner.subscribers.lock() else {
            warn!(collection, "subscriber list poisoned, skipping notification");
            return;
        };
        subscribers.retain(|sub| {
            if sub.collection != collection {
                return true;
            }
            let mut result: Vec<Value> = documents
                .iter()
                .filter(|doc| sub.predicate.matches(doc))
                .cloned()
                .collect();
            if let Some(sort) = &sub.sort {
                sort.apply(&mut result);
            }
            debug!(collection, subscription = sub.id, size = result.len(), "emit");
            sub.sender.send(result).is_ok()
        });
    }
}

fn apply_ops(document: &mut Value, update: &Update) -> Result<(), StoreError> {
    let Some(fields) = document.as_object_mut() else {
        return Err(StoreError::Validation("document is not an object".into()));
    };
    for (field, op) in update.ops() {
        match op {
            FieldOp::Set(value) => {
                fields.insert(field.clone(), value.clone());
            }
            FieldOp::Increment(by) => {
                let current = fields.get(field).and_then(Value::as_i64).unwrap_or(0);
                fields.insert(field.clone(), Value::from(current + by));
            }
            FieldOp::ArrayUnion(value) => {
                let entry = fields
                    .entry(field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Some(items) = entry.as_array_mut() {
                    if !items.contains(value) {
                        items.push(value.clone());
                    }
                }
            }
            FieldOp::ArrayRemove(value) => {
                if let Some(items) = fields.get_mut(field).and_then(Value::as_array_mut) {
                    items.retain(|item| item != value);
                }
            }
        }
    }
    Ok(())
}

impl DocumentStore for InMemoryStore {
    fn insert(&self, collection: &str, id: &str, document: Value) -> Result<(), StoreError> {
        self.fail_if_offline()?;
        if !document.is_object() {
            return Err(StoreError::Validation("document is not an object".into()));
        }
        {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), document);
        }
        self.notify(collection);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self
            .inner
            .collections
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn update(&self, collection: &str, id: &str, update: Update) -> Result<(), StoreError> {
        self.fail_if_offline()?;
        {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
            let document = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            apply_ops(document, &update)?;
        }
        self.notify(collection);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.fail_if_offline()?;
        let removed = {
            let mut collections = self
                .inner
                .collections
                .write()
                .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        if removed {
            self.notify(collection);
        }
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        predicate: &Predicate,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut result: Vec<Value> = self
            .collection_snapshot(collection)?
            .into_iter()
            .filter(|doc| predicate.matches(doc))
            .collect();
        if let Some(sort) = sort {
            sort.apply(&mut result);
        }
        Ok(result)
    }

    fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
        sort: Option<SortOrder>,
    ) -> Result<Subscription, StoreError> {
        let (sender, receiver) = flume::unbounded();
        let id = self.inner.next_subscription.fetch_add(1, Ordering::SeqCst);

        // Initial emission carries the current result set.
        let mut initial: Vec<Value> = self
            .collection_snapshot(collection)?
            .into_iter()
            .filter(|doc| predicate.matches(doc))
            .collect();
        if let Some(sort) = &sort {
            sort.apply(&mut initial);
        }
        let _ = sender.send(initial);

        let mut subscribers = self
            .inner
            .subscribers
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        subscribers.push(Subscriber {
            id,
            collection: collection.to_string(),
            predicate,
            sort,
            sender,
        });
        Ok(Subscription { id, receiver })
    }

    fn unsubscribe(&self, subscription_id: u64) {
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.retain(|sub| sub.id != subscription_id);
        }
    }
}
