//! [`WatcherRegistry`], a bulk-teardown bookkeeping structure an `Instance`
//! uses to tear down every watcher it owns (its render watcher, its computed
//! watchers, its user `watch` watchers) in one call when the instance is
//! destroyed (spec §4.8's `$destroy` / teardown ordering).
//!
//! This is the one place the reactive graph uses a
//! [`slotmap`](https://docs.rs/slotmap), rather than the per-watcher `Rc`
//! scheme the rest of the crate uses: owners here need a stable handle they
//! can hand out and later remove by key, not a self-contained reference.

use slotmap::{new_key_type, SlotMap};

use crate::watcher::{Watcher, WatcherOptions};

new_key_type! {
    /// Handle into a [`WatcherRegistry`].
    pub struct WatcherKey;
}

/// Owns a set of watchers on behalf of a single instance (or any other
/// long-lived owner), so they can all be torn down together.
pub struct WatcherRegistry<T: 'static> {
    slots: SlotMap<WatcherKey, Watcher<T>>,
}

impl<T: 'static> Default for WatcherRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq + Clone + 'static> WatcherRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    /// Creates a watcher and inserts it, returning the key to later remove it.
    pub fn insert_new(
        &mut self,
        context: impl Into<String>,
        getter: impl FnMut() -> T + 'static,
        cb: Option<Box<dyn FnMut(&T, &T)>>,
        options: WatcherOptions,
    ) -> WatcherKey {
        let watcher = Watcher::new(context, getter, cb, options);
        self.slots.insert(watcher)
    }

    /// Registers an already-constructed watcher.
    pub fn insert(&mut self, watcher: Watcher<T>) -> WatcherKey {
        self.slots.insert(watcher)
    }

    pub fn get(&self, key: WatcherKey) -> Option<&Watcher<T>> {
        self.slots.get(key)
    }

    /// Tears down and removes a single watcher.
    pub fn remove(&mut self, key: WatcherKey) {
        if let Some(watcher) = self.slots.remove(key) {
            watcher.teardown();
        }
    }

    /// Tears down every watcher currently registered, leaving the registry
    /// empty. Called once from instance destruction.
    pub fn teardown_all(&mut self) {
        for (_, watcher) in self.slots.drain() {
            watcher.teardown();
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
