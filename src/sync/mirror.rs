use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::{DocumentStore, Predicate, SortOrder};

/// A live local copy of one predicate-filtered remote collection.
///
/// Every emission from the store is the complete current result set, so
/// materializing an emission is a wholesale replacement: no per-document
/// merge, no deltas. When several emissions are pending, only the newest one
/// matters (last-snapshot-wins) and the rest are discarded undeserialized.
///
/// On disconnect the mirror keeps serving its last snapshot; re-establishing
/// the subscription is the transport's job, not ours.
pub struct Mirror<T> {
    store: Arc<dyn DocumentStore>,
    collection: String,
    subscription_id: u64,
    receiver: flume::Receiver<Vec<Value>>,
    latest: Vec<T>,
    closed: AtomicBool,
}

impl<T: DeserializeOwned> Mirror<T> {
    /// Subscribe and materialize the initial result set.
    pub fn open(
        store: Arc<dyn DocumentStore>,
        collection: &str,
        predicate: Predicate,
        sort: Option<SortOrder>,
    ) -> Result<Self, StoreError> {
        let subscription = store.subscribe(collection, predicate, sort)?;
        let mut mirror = Self {
            store,
            collection: collection.to_string(),
            subscription_id: subscription.id,
            receiver: subscription.receiver,
            latest: Vec::new(),
            closed: AtomicBool::new(false),
        };
        mirror.poll();
        Ok(mirror)
    }

    /// Drain pending emissions, materializing only the newest. Returns
    /// whether the snapshot changed. An empty result set is a valid
    /// emission, not an error.
    pub fn poll(&mut self) -> bool {
        match self.receiver.try_iter().last() {
            Some(documents) => {
                self.materialize(documents);
                true
            }
            None => false,
        }
    }

    /// Wait for the next emission, then drain as in [`poll`](Self::poll).
    /// Returns `false` once the subscription is gone for good; the last
    /// snapshot stays available either way.
    pub async fn changed(&mut self) -> bool {
        match self.receiver.recv_async().await {
            Ok(documents) => {
                let newest = self.receiver.try_iter().last().unwrap_or(documents);
                self.materialize(newest);
                true
            }
            Err(_) => false,
        }
    }

    /// The last materialized result set.
    pub fn snapshot(&self) -> &[T] {
        &self.latest
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Release the underlying subscription. Safe to call repeatedly, and
    /// safe to call while an emission from this mirror is being processed.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store.unsubscribe(self.subscription_id);
        }
    }

    fn materialize(&mut self, documents: Vec<Value>) {
        debug!(collection = %self.collection, size = documents.len(), "mirror update");
        self.latest = documents
            .into_iter()
            .filter_map(|doc| match serde_json::from_value(doc) {
                Ok(entity) => Some(entity),
                Err(err) => {
                    warn!(collection = %self.collection, %err, "skipping malformed document");
                    None
                }
            })
            .collect();
    }
}

impl<T> Drop for Mirror<T> {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store.unsubscribe(self.subscription_id);
        }
    }
}

impl<T> std::fmt::Debug for Mirror<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("collection", &self.collection)
            .field("subscription_id", &self.subscription_id)
            .field("len", &self.latest.len())
            .finish()
    }
}
