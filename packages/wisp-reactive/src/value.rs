//! [`Value`], the dynamically-typed, observed data cell used for `data`,
//! `props`, and anything else that needs property-level dependency tracking
//! over a JSON-shaped tree (spec §3, §4.3).

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::dep::Dep;
use crate::runtime;

/// A property slot inside a [`Value::Object`] or [`Value::Array`]: the
/// stored value plus the [`Dep`] that guards reads/writes of that single
/// slot (spec §4.1: "every reactive property owns one `Dep`").
#[derive(Clone)]
struct Property {
    value: Value,
    dep: Dep,
}

/// A dynamically-typed reactive value tree.
///
/// Every [`Value::Object`] and [`Value::Array`] is observed at construction
/// time: indexing into it via [`Value::get`]/[`Value::index`] registers a
/// dependency, and [`Value::set`]/[`Value::push`] (etc.) notify subscribers.
/// [`Value::Raw`] opts a subtree out of this, for frozen or host-owned data
/// (spec §4.3's `shouldObserve` toggle, surfaced permanently per-value here
/// rather than as a global flag the caller must remember to restore).
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(Rc<RefCell<ReactiveObject>>),
    Array(Rc<RefCell<ReactiveArray>>),
    /// An opaque, non-reactive payload. Reading it never depends, writing it
    /// (there is no writer) is not offered; replace the whole `Value` instead.
    Raw(Rc<dyn std::any::Any>),
}

pub(crate) struct ReactiveObject {
    dep: Dep,
    entries: Vec<(Rc<str>, Property)>,
}

pub(crate) struct ReactiveArray {
    dep: Dep,
    items: Vec<Property>,
}

impl Value {
    /// Wraps a plain object described as key/value pairs, giving each entry
    /// its own [`Dep`] (spec §4.3: `walk()`/`defineReactive`).
    pub fn object(entries: impl IntoIterator<Item = (impl Into<Rc<str>>, Value)>) -> Value {
        if !runtime::should_observe() {
            let entries: Vec<_> = entries
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect();
            return Value::Object(Rc::new(RefCell::new(ReactiveObject {
                dep: Dep::new(),
                entries: entries
                    .into_iter()
                    .map(|(k, v)| (k, Property { value: v, dep: Dep::new() }))
                    .collect(),
            })));
        }
        let entries = entries
            .into_iter()
            .map(|(k, v)| {
                (
                    k.into(),
                    Property {
                        value: v,
                        dep: Dep::new(),
                    },
                )
            })
            .collect();
        Value::Object(Rc::new(RefCell::new(ReactiveObject {
            dep: Dep::new(),
            entries,
        })))
    }

    /// Wraps a plain array, giving each element its own [`Dep`].
    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        let items = items
            .into_iter()
            .map(|value| Property {
                value,
                dep: Dep::new(),
            })
            .collect();
        Value::Array(Rc::new(RefCell::new(ReactiveArray {
            dep: Dep::new(),
            items,
        })))
    }

    /// Wraps `payload` as an unobserved value.
    pub fn raw(payload: impl std::any::Any) -> Value {
        Value::Raw(Rc::new(payload))
    }

    /// Reads an object property by key, registering a dependency on that
    /// property's own `Dep` (not the whole object's), plus — when the
    /// property holds a container — the child's own `Dep` (and, for an
    /// array, every element's `Dep`) so that mutating the child directly
    /// (`$set` on it, `arr.push(..)`) also notifies whoever read it through
    /// this property (spec §4.3: "if child observer exists, also
    /// `childOb.dep.depend()`, plus per-element depend for array values").
    /// Returns `Value::Null` if the key or the receiver isn't an object.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(obj) => {
                let obj = obj.borrow();
                match obj.entries.iter().find(|(k, _)| &**k == key) {
                    Some((_, prop)) => {
                        prop.dep.depend();
                        depend_child(&prop.value);
                        prop.value.clone()
                    }
                    None => {
                        obj.dep.depend();
                        Value::Null
                    }
                }
            }
            _ => Value::Null,
        }
    }

    /// Sets an object property, creating it (and notifying the object-level
    /// dep, since new keys aren't individually reactive until this call) if
    /// it didn't already exist. Mirrors spec §4.3's `Vue.set` semantics.
    pub fn set(&self, key: impl Into<Rc<str>>, value: Value) {
        let Value::Object(obj) = self else { return };
        let key = key.into();
        let mut obj_mut = obj.borrow_mut();
        if let Some((_, prop)) = obj_mut.entries.iter_mut().find(|(k, _)| *k == key) {
            let changed = !values_equal(&prop.value, &value);
            prop.value = value;
            let dep = prop.dep.clone();
            drop(obj_mut);
            if changed {
                dep.notify();
            }
            return;
        }
        let dep = Dep::new();
        obj_mut.entries.push((key, Property { value, dep }));
        let obj_dep = obj_mut.dep.clone();
        drop(obj_mut);
        obj_dep.notify();
    }

    /// Snapshot of the current key set. Reading this depends on the
    /// object-level dep (new/removed keys), not on any individual property.
    pub fn keys(&self) -> Vec<Rc<str>> {
        match self {
            Value::Object(obj) => {
                let obj = obj.borrow();
                obj.dep.depend();
                obj.entries.iter().map(|(k, _)| k.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Deletes an object property, notifying the object-level dep (since
    /// existing watchers of that property have no way to observe its own
    /// deletion otherwise). Mirrors `Vue.delete`.
    pub fn del(&self, key: &str) {
        let Value::Object(obj) = self else { return };
        let mut obj_mut = obj.borrow_mut();
        let before = obj_mut.entries.len();
        obj_mut.entries.retain(|(k, _)| &**k != key);
        if obj_mut.entries.len() != before {
            let dep = obj_mut.dep.clone();
            drop(obj_mut);
            dep.notify();
        }
    }

    /// Reads an array element by index, registering a dependency on that
    /// element's own `Dep` plus, when the element holds a container, the
    /// same child-dep/per-element depending [`Value::get`] does.
    pub fn index(&self, i: usize) -> Value {
        match self {
            Value::Array(arr) => {
                let arr = arr.borrow();
                match arr.items.get(i) {
                    Some(prop) => {
                        prop.dep.depend();
                        depend_child(&prop.value);
                        prop.value.clone()
                    }
                    None => {
                        arr.dep.depend();
                        Value::Null
                    }
                }
            }
            _ => Value::Null,
        }
    }

    /// Number of entries/elements, or 0 for non-container values.
    pub fn len(&self) -> usize {
        match self {
            Value::Object(obj) => obj.borrow().entries.len(),
            Value::Array(arr) => arr.borrow().items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `push` array mutator: appends, notifying the array-level dep (spec
    /// §4.3: "the seven intercepted array mutators... notify the owning
    /// array's dep after mutating").
    pub fn push(&self, value: Value) {
        let Value::Array(arr) = self else { return };
        let mut arr_mut = arr.borrow_mut();
        arr_mut.items.push(Property {
            value,
            dep: Dep::new(),
        });
        let dep = arr_mut.dep.clone();
        drop(arr_mut);
        dep.notify();
    }

    /// `pop` array mutator.
    pub fn pop(&self) -> Option<Value> {
        let Value::Array(arr) = self else { return None };
        let mut arr_mut = arr.borrow_mut();
        let popped = arr_mut.items.pop().map(|p| p.value);
        let dep = arr_mut.dep.clone();
        drop(arr_mut);
        if popped.is_some() {
            dep.notify();
        }
        popped
    }

    /// `shift` array mutator.
    pub fn shift(&self) -> Option<Value> {
        let Value::Array(arr) = self else { return None };
        let mut arr_mut = arr.borrow_mut();
        if arr_mut.items.is_empty() {
            return None;
        }
        let popped = arr_mut.items.remove(0).value;
        let dep = arr_mut.dep.clone();
        drop(arr_mut);
        dep.notify();
        Some(popped)
    }

    /// `unshift` array mutator.
    pub fn unshift(&self, value: Value) {
        let Value::Array(arr) = self else { return };
        let mut arr_mut = arr.borrow_mut();
        arr_mut.items.insert(
            0,
            Property {
                value,
                dep: Dep::new(),
            },
        );
        let dep = arr_mut.dep.clone();
        drop(arr_mut);
        dep.notify();
    }

    /// `splice` array mutator: removes `delete_count` elements starting at
    /// `start`, inserting `items` in their place, and returns the removed
    /// elements.
    pub fn splice(&self, start: usize, delete_count: usize, items: Vec<Value>) -> Vec<Value> {
        let Value::Array(arr) = self else { return Vec::new() };
        let mut arr_mut = arr.borrow_mut();
        let start = start.min(arr_mut.items.len());
        let end = (start + delete_count).min(arr_mut.items.len());
        let removed: Vec<Value> = arr_mut
            .items
            .splice(
                start..end,
                items.into_iter().map(|value| Property {
                    value,
                    dep: Dep::new(),
                }),
            )
            .map(|p| p.value)
            .collect();
        let dep = arr_mut.dep.clone();
        drop(arr_mut);
        dep.notify();
        removed
    }

    /// `sort` array mutator, using `cmp` as the comparator.
    pub fn sort_by(&self, cmp: impl FnMut(&Value, &Value) -> std::cmp::Ordering) {
        let Value::Array(arr) = self else { return };
        let mut arr_mut = arr.borrow_mut();
        let mut cmp = cmp;
        arr_mut.items.sort_by(|a, b| cmp(&a.value, &b.value));
        let dep = arr_mut.dep.clone();
        drop(arr_mut);
        dep.notify();
    }

    /// `reverse` array mutator.
    pub fn reverse(&self) {
        let Value::Array(arr) = self else { return };
        let mut arr_mut = arr.borrow_mut();
        arr_mut.items.reverse();
        let dep = arr_mut.dep.clone();
        drop(arr_mut);
        dep.notify();
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        // NaN-aware: two NaNs compare unequal under IEEE 754, but a setter
        // re-assigning the same NaN should not be treated as a change
        // (spec §4.2's `run()`: "differs (by identity... or `NaN`-aware)").
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Raw(x), Value::Raw(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// `Value` equality is the same NaN-aware, identity-based comparison
/// [`Value::set`] uses to decide whether to notify (spec §4.2/§4.3), so
/// that a `Watcher<Value>` can detect "no real change" the same way a
/// reactive property's setter does.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}

/// Recursively `depend()`s on every nested `Dep` reachable from `value`, for
/// `deep: true` watchers (spec §4.2). `seen` breaks reference cycles between
/// objects/arrays holding `Rc`s to one another.
pub(crate) fn deep_traverse(value: &Value, seen: &mut HashSet<usize>) {
    match value {
        Value::Object(obj) => {
            let ptr = Rc::as_ptr(obj) as usize;
            if !seen.insert(ptr) {
                return;
            }
            let obj = obj.borrow();
            obj.dep.depend();
            for (_, prop) in obj.entries.iter() {
                prop.dep.depend();
                deep_traverse(&prop.value, seen);
            }
        }
        Value::Array(arr) => {
            let ptr = Rc::as_ptr(arr) as usize;
            if !seen.insert(ptr) {
                return;
            }
            let arr = arr.borrow();
            arr.dep.depend();
            for prop in arr.items.iter() {
                prop.dep.depend();
                deep_traverse(&prop.value, seen);
            }
        }
        _ => {}
    }
}

/// `depend()`s on a container value's own dep — and, if it's an array, every
/// element's dep too — without recursing into grandchildren. Called after a
/// property/element read whose value is itself a container, so a write
/// reaching that container directly (`$set`, a mutator) still notifies
/// whoever read it through the parent (spec §4.3: "if child observer
/// exists, also `childOb.dep.depend()`, plus per-element depend for array
/// values").
fn depend_child(value: &Value) {
    match value {
        Value::Object(obj) => obj.borrow().dep.depend(),
        Value::Array(_) => depend_array(value),
        _ => {}
    }
}

/// `depend()`s on every element-level dep of an array without descending
/// into nested containers (spec §4.3's `dependArray`, used when an array is
/// read as a whole rather than indexed into).
pub fn depend_array(value: &Value) {
    if let Value::Array(arr) = value {
        let arr = arr.borrow();
        arr.dep.depend();
        for prop in arr.items.iter() {
            prop.dep.depend();
            if matches!(prop.value, Value::Array(_)) {
                depend_array(&prop.value);
            }
        }
    }
}
