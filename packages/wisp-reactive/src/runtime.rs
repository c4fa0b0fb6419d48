//! Process-global (thread-local) reactive state: the active-target stack, id
//! counters, the scheduler queue, and the handful of toggles the rest of the
//! crate reads.
//!
//! Everything here is `thread_local!` rather than a true global because the
//! reactivity model is single-threaded cooperative (spec §5): there is never
//! more than one evaluation in flight, so a `Cell`/`RefCell`-based singleton
//! is sufficient and avoids the locking a `Mutex`-backed global would need.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ReactiveError;
use crate::watcher::WatcherOps;

static NEXT_DEP_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_WATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// Default per-flush run-count threshold before a watcher is considered stuck
/// in an infinite update loop and dropped for the rest of the flush.
pub const DEFAULT_CYCLE_THRESHOLD: u32 = 100;

pub(crate) type WatcherHandle = Rc<dyn WatcherOps>;

struct Runtime {
    /// Stack of watchers currently being evaluated. The top is "current".
    target_stack: RefCell<Vec<WatcherHandle>>,
    /// Watchers queued for the next scheduler flush, in insertion order.
    queue: RefCell<VecDeque<WatcherHandle>>,
    /// Ids already present in `queue`, for O(1) dedup.
    queued_ids: RefCell<std::collections::HashSet<u64>>,
    flushing: Cell<bool>,
    run_counts: RefCell<HashMap<u64, u32>>,
    cycle_threshold: Cell<u32>,
    /// Suppresses `observe()` from wrapping new values; used while assigning
    /// default prop values on non-root instances (spec §4.3).
    should_observe: Cell<bool>,
    error_handler: RefCell<Option<Rc<dyn Fn(ReactiveError)>>>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            target_stack: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            queued_ids: RefCell::new(std::collections::HashSet::new()),
            flushing: Cell::new(false),
            run_counts: RefCell::new(HashMap::new()),
            cycle_threshold: Cell::new(DEFAULT_CYCLE_THRESHOLD),
            should_observe: Cell::new(true),
            error_handler: RefCell::new(None),
        }
    }
}

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

pub(crate) fn next_dep_id() -> u64 {
    NEXT_DEP_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn next_watcher_id() -> u64 {
    NEXT_WATCHER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Pushes a watcher onto the active-target stack. Mirrors `Dep.target = watcher; targetStack.push(watcher)`.
pub(crate) fn push_target(watcher: WatcherHandle) {
    RUNTIME.with(|rt| rt.target_stack.borrow_mut().push(watcher));
}

/// Pops the active-target stack.
pub(crate) fn pop_target() {
    RUNTIME.with(|rt| {
        rt.target_stack.borrow_mut().pop();
    });
}

/// The watcher currently being evaluated, if any.
pub(crate) fn current_target() -> Option<WatcherHandle> {
    RUNTIME.with(|rt| rt.target_stack.borrow().last().cloned())
}

/// Runs `f` with the active-target stack temporarily empty (spec's `untrack`/
/// deep-traversal boundary use this to read values without adding dependencies).
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let saved = RUNTIME.with(|rt| rt.target_stack.replace(Vec::new()));
    let ret = f();
    RUNTIME.with(|rt| rt.target_stack.replace(saved));
    ret
}

/// Enqueues a watcher for the next scheduler flush, deduplicating by id and
/// preserving FIFO order, per spec §5.
pub(crate) fn queue_watcher(watcher: WatcherHandle) {
    RUNTIME.with(|rt| {
        let id = watcher.id();
        if rt.queued_ids.borrow_mut().insert(id) {
            rt.queue.borrow_mut().push_back(watcher);
        }
        if !rt.flushing.get() {
            flush_schedule_queue();
        }
    });
}

/// Runs every currently-queued watcher in ascending-id order, re-queuing any
/// watcher that enqueues more work during the flush (spec §5: "may enqueue
/// further watchers, which are appended and flushed in the same pass").
pub fn flush_schedule_queue() {
    RUNTIME.with(|rt| {
        if rt.flushing.get() {
            return;
        }
        rt.flushing.set(true);
        rt.run_counts.borrow_mut().clear();

        loop {
            let mut batch: Vec<WatcherHandle> = rt.queue.borrow_mut().drain(..).collect();
            rt.queued_ids.borrow_mut().clear();
            if batch.is_empty() {
                break;
            }
            batch.sort_by_key(|w| w.id());

            for watcher in batch {
                let count = {
                    let mut counts = rt.run_counts.borrow_mut();
                    let entry = counts.entry(watcher.id()).or_insert(0);
                    *entry += 1;
                    *entry
                };
                let threshold = rt.cycle_threshold.get();
                if count > threshold {
                    report_error(ReactiveError::WatcherCycleDetected { threshold });
                    #[cfg(feature = "trace")]
                    tracing::warn!(watcher = watcher.id(), threshold, "watcher update loop aborted");
                    continue;
                }
                watcher.run();
            }
        }

        rt.flushing.set(false);
    });
}

/// Runs `f` while batching updates: queued watchers are not flushed until `f`
/// returns, matching §5's "Synchronous watchers... bypass the queue" /
/// default-queue semantics.
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    RUNTIME.with(|rt| rt.flushing.set(true));
    let ret = f();
    RUNTIME.with(|rt| rt.flushing.set(false));
    flush_schedule_queue();
    ret
}

pub(crate) fn should_observe() -> bool {
    RUNTIME.with(|rt| rt.should_observe.get())
}

/// Temporarily suppresses `observe()` for the duration of `f`. Used by
/// `wisp-core` while assigning prop defaults on non-root instances.
pub fn with_observation_suppressed<T>(f: impl FnOnce() -> T) -> T {
    RUNTIME.with(|rt| rt.should_observe.set(false));
    let ret = f();
    RUNTIME.with(|rt| rt.should_observe.set(true));
    ret
}

/// Overrides the per-flush watcher run-count threshold (default
/// [`DEFAULT_CYCLE_THRESHOLD`]).
pub fn set_cycle_threshold(threshold: u32) {
    RUNTIME.with(|rt| rt.cycle_threshold.set(threshold));
}

/// Installs the sink that [`ReactiveError`]s are routed to. Replaces any
/// previously installed handler.
pub fn set_error_handler(handler: impl Fn(ReactiveError) + 'static) {
    RUNTIME.with(|rt| *rt.error_handler.borrow_mut() = Some(Rc::new(handler)));
}

pub(crate) fn report_error(err: ReactiveError) {
    RUNTIME.with(|rt| {
        if let Some(handler) = rt.error_handler.borrow().as_ref() {
            handler(err);
        } else {
            #[cfg(feature = "trace")]
            tracing::warn!(%err, "unhandled reactive error");
            #[cfg(not(feature = "trace"))]
            let _ = err;
        }
    });
}

#[cfg(test)]
pub(crate) fn reset_for_tests() {
    RUNTIME.with(|rt| {
        rt.target_stack.borrow_mut().clear();
        rt.queue.borrow_mut().clear();
        rt.queued_ids.borrow_mut().clear();
        rt.flushing.set(false);
        rt.run_counts.borrow_mut().clear();
        rt.cycle_threshold.set(DEFAULT_CYCLE_THRESHOLD);
        rt.should_observe.set(true);
    });
}
