//! Namespaced listener registry.
//!
//! The registry maps namespace names to numbered callbacks. Ids are
//! allocated sequentially per namespace starting from 0 and are never
//! reused while the namespace is alive, so an id stays a unique handle
//! until it is explicitly removed.
//!
//! # Example
//!
//! ```
//! use onix_client::listener::ListenerRegistry;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let registry = ListenerRegistry::<u32>::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = seen.clone();
//! let id = registry.add("numbers", move |n: &u32| {
//!     counter.fetch_add(*n as usize, Ordering::SeqCst);
//! });
//!
//! registry.broadcast("numbers", &5);
//! registry.remove("numbers", id);
//! registry.broadcast("numbers", &5);
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 5);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifier of a listener inside its namespace.
pub type ListenerId = u64;

/// Shared callback stored in the registry.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Callbacks of one namespace.
struct Collection<T> {
    /// Next id to hand out.
    next_index: ListenerId,
    /// Live callbacks, ordered by id (= insertion order).
    entries: BTreeMap<ListenerId, Listener<T>>,
}

impl<T> Collection<T> {
    fn new() -> Self {
        Self {
            next_index: 0,
            entries: BTreeMap::new(),
        }
    }
}

struct Namespaces<T> {
    /// Every namespace name ever touched.
    known: BTreeSet<String>,
    /// Collections by namespace, created on first `add`.
    collections: HashMap<String, Collection<T>>,
}

/// Registry of callbacks partitioned by namespace.
///
/// Every operation takes the namespace explicitly. The internal lock is
/// never held while a callback runs, so callbacks may add or remove
/// listeners (in any namespace) while a broadcast is in progress.
pub struct ListenerRegistry<T> {
    inner: Mutex<Namespaces<T>>,
}

impl<T> ListenerRegistry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Namespaces {
                known: BTreeSet::new(),
                collections: HashMap::new(),
            }),
        }
    }

    /// Register a callback in `namespace` and return its id.
    pub fn add<F>(&self, namespace: &str, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        inner.known.insert(namespace.to_string());
        let collection = inner
            .collections
            .entry(namespace.to_string())
            .or_insert_with(Collection::new);

        let id = collection.next_index;
        collection.next_index += 1;
        collection.entries.insert(id, Arc::new(listener));
        id
    }

    /// Remove a callback. Returns `false` when it was not registered.
    pub fn remove(&self, namespace: &str, id: ListenerId) -> bool {
        let removed = {
            let mut inner = self.inner.lock();
            inner.known.insert(namespace.to_string());
            inner
                .collections
                .get_mut(namespace)
                .and_then(|c| c.entries.remove(&id))
        };
        // Dropped outside the lock: the callback may own resources whose
        // destructors touch this registry.
        removed.is_some()
    }

    /// Invoke every live callback of `namespace` with `data`, in id order.
    ///
    /// The set of ids is captured when the broadcast starts. A callback
    /// removed by an earlier callback of the same pass is skipped, and
    /// callbacks added during the pass are not invoked.
    pub fn broadcast(&self, namespace: &str, data: &T) {
        let ids: Vec<ListenerId> = {
            let mut inner = self.inner.lock();
            inner.known.insert(namespace.to_string());
            match inner.collections.get(namespace) {
                Some(collection) => collection.entries.keys().copied().collect(),
                None => return,
            }
        };

        for id in ids {
            let listener = self.get(namespace, id);
            if let Some(listener) = listener {
                listener(data);
            }
        }
    }

    /// Hand every live callback of `namespace` to `handler`.
    pub fn for_each<H>(&self, namespace: &str, mut handler: H)
    where
        H: FnMut(ListenerId, &Listener<T>),
    {
        let snapshot: Vec<(ListenerId, Listener<T>)> = {
            let mut inner = self.inner.lock();
            inner.known.insert(namespace.to_string());
            match inner.collections.get(namespace) {
                Some(collection) => collection
                    .entries
                    .iter()
                    .map(|(id, listener)| (*id, listener.clone()))
                    .collect(),
                None => return,
            }
        };

        for (id, listener) in &snapshot {
            handler(*id, listener);
        }
    }

    /// Remove every callback of `namespace`. The id counter keeps running.
    pub fn remove_namespace_listeners(&self, namespace: &str) {
        let removed = {
            let mut inner = self.inner.lock();
            match inner.collections.get_mut(namespace) {
                Some(collection) => std::mem::take(&mut collection.entries),
                None => BTreeMap::new(),
            }
        };
        drop(removed);
    }

    /// Remove every callback of every namespace.
    pub fn remove_all_listeners(&self) {
        let removed: Vec<BTreeMap<ListenerId, Listener<T>>> = {
            let mut inner = self.inner.lock();
            inner
                .collections
                .values_mut()
                .map(|c| std::mem::take(&mut c.entries))
                .collect()
        };
        drop(removed);
    }

    /// Every namespace name that has been used, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        self.inner.lock().known.iter().cloned().collect()
    }

    /// Number of live callbacks in `namespace`.
    pub fn len(&self, namespace: &str) -> usize {
        self.inner
            .lock()
            .collections
            .get(namespace)
            .map_or(0, |c| c.entries.len())
    }

    /// Whether `namespace` has no live callbacks.
    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }

    /// Whether `id` is still registered in `namespace`.
    pub fn contains(&self, namespace: &str, id: ListenerId) -> bool {
        self.inner
            .lock()
            .collections
            .get(namespace)
            .is_some_and(|c| c.entries.contains_key(&id))
    }

    fn get(&self, namespace: &str, id: ListenerId) -> Option<Listener<T>> {
        self.inner
            .lock()
            .collections
            .get(namespace)
            .and_then(|c| c.entries.get(&id))
            .cloned()
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a listener when dropped unless disarmed.
///
/// Used for correlated waits: whichever way the wait ends (reply,
/// timeout, or the caller dropping the future) the listener goes away.
pub struct ListenerGuard<T> {
    registry: Arc<ListenerRegistry<T>>,
    namespace: &'static str,
    id: ListenerId,
    armed: bool,
}

impl<T> ListenerGuard<T> {
    /// Guard the listener `id` registered in `namespace`.
    pub fn new(registry: Arc<ListenerRegistry<T>>, namespace: &'static str, id: ListenerId) -> Self {
        Self {
            registry,
            namespace,
            id,
            armed: true,
        }
    }

    /// The guarded listener id.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Keep the listener registered and return its id.
    pub fn disarm(mut self) -> ListenerId {
        self.armed = false;
        self.id
    }
}

impl<T> Drop for ListenerGuard<T> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.remove(self.namespace, self.id);
        }
    }
}
