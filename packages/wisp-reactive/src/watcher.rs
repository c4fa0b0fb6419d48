//! [`Watcher`], the reactive computation that ties a getter, a callback, and
//! a live dep set together (spec §3, §4.2).

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::dep::Dep;
use crate::error::ReactiveError;
use crate::runtime::{self, WatcherHandle};
use crate::value::{deep_traverse, Value};

/// `true` when `value` is a [`Value::Object`]/[`Value::Array`] — a
/// container mutated through its own `Dep` rather than by reassigning
/// whatever holds it, so a watcher over one must fire on every re-evaluation
/// regardless of identity (spec §4.2's "object/deep" change check).
fn is_container_value<T: 'static>(value: &T) -> bool {
    match (value as &dyn Any).downcast_ref::<Value>() {
        Some(v) => matches!(v, Value::Object(_) | Value::Array(_)),
        None => false,
    }
}

/// Object-safe face of a [`Watcher<T>`], used for anything that needs to
/// hold or call a watcher without knowing its value type: the active-target
/// stack, a [`Dep`]'s subscriber list, and the scheduler queue.
pub(crate) trait WatcherOps {
    fn id(&self) -> u64;
    /// Called by [`Dep::depend`] when this watcher is the current target.
    fn add_new_dep(&self, dep: Dep);
    /// Dispatch per spec §4.2 `update()`: lazy watchers just go dirty,
    /// sync watchers re-run immediately, everything else is queued.
    fn update(&self);
    /// Re-evaluate if active (called directly for `sync` watchers, or from
    /// the scheduler flush for queued ones).
    fn run(&self);
    /// Unsubscribes from every dep and marks the watcher inactive.
    fn teardown(&self);
}

/// Construction-time options controlling how a [`Watcher`] behaves (spec
/// §4.2's table: `lazy`/`user`/`deep`/`sync`/`before`).
#[derive(Default, Clone)]
pub struct WatcherOptions {
    /// Start dirty, don't evaluate until first read. Used for computed props.
    pub lazy: bool,
    /// Route getter/callback panics through the error channel with context
    /// instead of unwinding past the watcher boundary.
    pub user: bool,
    /// After reading the root value, recursively touch every nested dep so
    /// that mutating any nested property also triggers this watcher.
    pub deep: bool,
    /// `update()` calls `run()` immediately instead of queueing.
    pub sync: bool,
    /// Invoked just before `run()`, e.g. to fire `beforeUpdate`.
    pub before: Option<Rc<dyn Fn()>>,
}

struct WatcherState<T> {
    id: u64,
    context: String,
    self_handle: Weak<WatcherCell<T>>,
    getter: Option<Box<dyn FnMut() -> T>>,
    value: Option<T>,
    cb: Option<Box<dyn FnMut(&T, &T)>>,
    deps: Vec<Dep>,
    dep_ids: HashSet<u64>,
    new_deps: Vec<Dep>,
    new_dep_ids: HashSet<u64>,
    dirty: bool,
    active: bool,
    options: WatcherOptions,
}

struct WatcherCell<T>(RefCell<WatcherState<T>>);

impl<T: PartialEq + Clone + 'static> WatcherCell<T> {
    fn self_rc(&self) -> Rc<Self> {
        self.0
            .borrow()
            .self_handle
            .upgrade()
            .expect("watcher dropped while still executing")
    }
}

/// A reactive computation: a getter, an optional callback, and the live set
/// of deps it touched on its last evaluation.
///
/// Cheap to clone; all clones share the same underlying state.
pub struct Watcher<T: 'static>(Rc<WatcherCell<T>>);

impl<T: 'static> Clone for Watcher<T> {
    fn clone(&self) -> Self {
        Watcher(self.0.clone())
    }
}

impl<T: PartialEq + Clone + 'static> Watcher<T> {
    /// Creates a new watcher around `getter`, optionally with a change
    /// callback. If `options.lazy` is set, the getter is not invoked until
    /// the first call to [`Watcher::evaluate`] or [`Watcher::evaluate_if_dirty`].
    ///
    /// `context` is used only for diagnostics (the "context string" spec §7
    /// requires when routing `user` watcher errors).
    pub fn new(
        context: impl Into<String>,
        getter: impl FnMut() -> T + 'static,
        cb: Option<Box<dyn FnMut(&T, &T)>>,
        options: WatcherOptions,
    ) -> Self {
        let lazy = options.lazy;
        let state = WatcherState {
            id: runtime::next_watcher_id(),
            context: context.into(),
            self_handle: Weak::new(),
            getter: Some(Box::new(getter)),
            value: None,
            cb,
            deps: Vec::new(),
            dep_ids: HashSet::new(),
            new_deps: Vec::new(),
            new_dep_ids: HashSet::new(),
            dirty: lazy,
            active: true,
            options,
        };
        let cell = Rc::new(WatcherCell(RefCell::new(state)));
        cell.0.borrow_mut().self_handle = Rc::downgrade(&cell);
        let watcher = Watcher(cell);
        if !lazy {
            watcher.evaluate();
        }
        watcher
    }

    fn handle(&self) -> WatcherHandle {
        self.0.clone() as WatcherHandle
    }

    /// This watcher's stable id. Watchers run in ascending-id order within a
    /// flush, which is also creation order (spec §5: "parents before
    /// children... by construction order").
    pub fn id(&self) -> u64 {
        self.0 .0.borrow().id
    }

    /// `true` for a lazy watcher that hasn't been (re-)evaluated since its
    /// last dependency changed.
    pub fn dirty(&self) -> bool {
        self.0 .0.borrow().dirty
    }

    /// `true` until [`Watcher::teardown`] has been called.
    pub fn is_active(&self) -> bool {
        self.0 .0.borrow().active
    }

    /// Returns the current cached value, evaluating first if dirty. Use this
    /// for lazy (computed) watchers.
    pub fn evaluate_if_dirty(&self) -> T {
        if self.dirty() {
            self.evaluate();
        }
        self.0
             .0
            .borrow()
            .value
            .clone()
            .expect("watcher evaluated but has no value")
    }

    /// Pushes each of this watcher's current deps as a dependency of the
    /// watcher currently being evaluated (used by computed property reads,
    /// spec §4.6 step 2: "depend() on each of the watcher's collected deps").
    pub fn depend_on_deps(&self) {
        for dep in self.0 .0.borrow().deps.iter() {
            dep.depend();
        }
    }

    /// Re-evaluates the getter, reconciling the dep set, per spec §4.2.
    pub fn evaluate(&self) {
        let handle = self.handle();
        runtime::push_target(handle);

        // Take the getter out before calling it so that nested `depend()`
        // calls re-entering this same watcher's `RefCell` (via
        // `add_new_dep`) don't collide with an outstanding borrow.
        let mut getter = self
            .0
             .0
            .borrow_mut()
            .getter
            .take()
            .expect("watcher getter missing");
        let context = self.0 .0.borrow().context.clone();
        let options_user = self.0 .0.borrow().options.user;

        let result = if options_user {
            panic::catch_unwind(AssertUnwindSafe(&mut getter))
        } else {
            Ok(getter())
        };

        runtime::pop_target();

        let new_value = match result {
            Ok(v) => v,
            Err(_) => {
                runtime::report_error(ReactiveError::UserCallbackPanicked {
                    context: format!("watcher getter for {context}"),
                });
                self.0 .0.borrow_mut().getter = Some(getter);
                return;
            }
        };

        if self.0 .0.borrow().options.deep {
            if let Some(v) = (&new_value as &dyn Any).downcast_ref::<Value>() {
                let mut seen = HashSet::new();
                deep_traverse(v, &mut seen);
            }
        }

        let mut state = self.0 .0.borrow_mut();
        state.getter = Some(getter);

        // Reconcile: anything in the old dep set not touched this round is
        // unsubscribed from; the new set becomes current.
        let stale: Vec<Dep> = state
            .deps
            .iter()
            .filter(|d| !state.new_dep_ids.contains(&d.id()))
            .cloned()
            .collect();
        let id = state.id;
        for dep in &stale {
            dep.remove_sub(id);
        }
        state.deps = std::mem::take(&mut state.new_deps);
        state.dep_ids = std::mem::take(&mut state.new_dep_ids);
        state.value = Some(new_value);
        state.dirty = false;
    }

    /// Unsubscribes from every dep this watcher currently holds and marks it
    /// inactive. Any already-queued `run()` becomes a no-op.
    pub fn teardown(&self) {
        WatcherOps::teardown(&*self.0);
    }
}

impl<T: PartialEq + Clone + 'static> WatcherOps for WatcherCell<T> {
    fn id(&self) -> u64 {
        self.0.borrow().id
    }

    fn add_new_dep(&self, dep: Dep) {
        let mut state = self.0.borrow_mut();
        if state.new_dep_ids.insert(dep.id()) {
            let already_subscribed = state.dep_ids.contains(&dep.id());
            state.new_deps.push(dep.clone());
            if !already_subscribed {
                drop(state);
                dep.add_sub(self.self_rc() as WatcherHandle);
            }
        }
    }

    fn update(&self) {
        let is_lazy = self.0.borrow().options.lazy;
        let is_sync = self.0.borrow().options.sync;
        if is_lazy {
            self.0.borrow_mut().dirty = true;
        } else if is_sync {
            self.run();
        } else {
            runtime::queue_watcher(self.self_rc() as WatcherHandle);
        }
    }

    fn run(&self) {
        if !self.0.borrow().active {
            return;
        }
        if let Some(before) = self.0.borrow().options.before.clone() {
            before();
        }

        let watcher = Watcher(self.self_rc());
        let old_value = self.0.borrow().value.clone();
        watcher.evaluate();
        let new_value = self.0.borrow().value.clone();

        // Spec §4.2: fire "if new value differs (by identity, or
        // object/deep, or NaN-aware)". Equality alone under-fires for a
        // `deep: true` watcher (its getter's return value can be identity-
        // equal while a nested property changed) and for any watcher whose
        // value is itself a container, since containers are mutated through
        // their own Dep rather than by reassigning the getter's projection.
        let force_fire = self.0.borrow().options.deep
            || new_value.as_ref().map(is_container_value).unwrap_or(false);
        if !force_fire {
            if let (Some(old), Some(new)) = (&old_value, &new_value) {
                if old == new {
                    return;
                }
            }
        }
        let Some(new) = new_value else { return };
        let old = old_value.unwrap_or_else(|| new.clone());

        let mut cb = self.0.borrow_mut().cb.take();
        if let Some(cb_fn) = cb.as_mut() {
            let context = self.0.borrow().context.clone();
            let user = self.0.borrow().options.user;
            let result = if user {
                panic::catch_unwind(AssertUnwindSafe(|| cb_fn(&new, &old)))
            } else {
                cb_fn(&new, &old);
                Ok(())
            };
            if result.is_err() {
                runtime::report_error(ReactiveError::UserCallbackPanicked {
                    context: format!("watcher callback for {context}"),
                });
            }
        }
        self.0.borrow_mut().cb = cb;
    }

    fn teardown(&self) {
        let mut state = self.0.borrow_mut();
        if !state.active {
            return;
        }
        state.active = false;
        let id = state.id;
        let deps = std::mem::take(&mut state.deps);
        drop(state);
        for dep in deps {
            dep.remove_sub(id);
        }
    }
}
