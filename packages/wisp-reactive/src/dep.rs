//! [`Dep`], the pub/sub primitive every reactive property and every observed
//! object/array owns exactly one of (spec §3, §4.1).

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::{self, WatcherHandle};

struct DepInner {
    id: u64,
    subs: RefCell<Vec<WatcherHandle>>,
}

/// A dependency node. Cloning a `Dep` clones the handle, not the subscriber
/// list underneath it — all clones observe the same subscribers.
#[derive(Clone)]
pub struct Dep(Rc<DepInner>);

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl Dep {
    /// Creates a fresh dependency node with a new monotonically increasing id.
    pub fn new() -> Self {
        Dep(Rc::new(DepInner {
            id: runtime::next_dep_id(),
            subs: RefCell::new(Vec::new()),
        }))
    }

    /// Stable identity of this dep, used to order notifications and to dedup
    /// subscriptions.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// If a watcher is currently being evaluated, registers this dep as one
    /// of its dependencies (spec §4.1).
    pub fn depend(&self) {
        if let Some(target) = runtime::current_target() {
            target.add_new_dep(self.clone());
        }
    }

    /// Adds `watcher` as a subscriber if it isn't already one.
    pub(crate) fn add_sub(&self, watcher: WatcherHandle) {
        let mut subs = self.0.subs.borrow_mut();
        if !subs.iter().any(|w| w.id() == watcher.id()) {
            subs.push(watcher);
        }
    }

    /// Removes the subscriber with the given id, if present.
    pub(crate) fn remove_sub(&self, watcher_id: u64) {
        self.0.subs.borrow_mut().retain(|w| w.id() != watcher_id);
    }

    /// Notifies every subscriber, in ascending watcher-id order (spec §4.1,
    /// §5: "a setter's notify() visits the subscriber set in id-ascending
    /// order").
    pub fn notify(&self) {
        let mut subs: Vec<WatcherHandle> = self.0.subs.borrow().clone();
        subs.sort_by_key(|w| w.id());
        for watcher in subs {
            watcher.update();
        }
    }

    /// Number of current subscribers. Exposed for tests and diagnostics.
    pub fn sub_count(&self) -> usize {
        self.0.subs.borrow().len()
    }
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for Dep {}
