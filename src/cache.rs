//! Keyed resource cache with single-flight construction
//!
//! Expensive clients (embedding provider, vector store handle,
//! retrieval chain) are built once per distinct parameter set and
//! shared as `Arc`s. Concurrent callers for the same uncached key wait
//! on one factory invocation instead of racing to build duplicates,
//! and a failed construction is never cached, so the next caller
//! retries cleanly.

use crate::error::Result;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

type Slot<V> = Arc<OnceCell<Arc<V>>>;

/// A process-lifetime cache from construction parameters to a shared resource
pub struct ResourceCache<K, V: ?Sized> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V: ?Sized> Default for ResourceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: ?Sized> ResourceCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached resource for `key`, building it with `factory`
    /// on first use
    ///
    /// Identical keys observe the identical `Arc`. The per-key
    /// `OnceCell` serializes concurrent first calls; a factory error
    /// leaves the cell empty.
    pub async fn get_or_create<F, Fut>(&self, key: &K, factory: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<V>>>,
    {
        let slot = {
            let mut slots = self.slots.lock().expect("resource cache lock poisoned");
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let resource = slot.get_or_try_init(factory).await?;
        Ok(Arc::clone(resource))
    }

    /// Number of keys with a successfully built resource
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().expect("resource cache lock poisoned");
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
