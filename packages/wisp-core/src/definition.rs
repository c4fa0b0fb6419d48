//! The "component class" equivalent: [`Definition`] plus the global API
//! surface spec §6 describes (`use`, `mixin`, `extend`,
//! `component`/`directive`/`filter`, `set`/`delete`/`observable`).
//!
//! Spec §9's redesign note replaces prototype-chain constructor inheritance
//! with "a component-definition record carrying `super_id`, `sealed_options`,
//! and `extend_options`"; that's exactly the shape of [`Definition`] below.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use wisp_reactive::Value;

use crate::instance::{Instance, ParentListener};
use crate::options::{
    json_to_reactive, merge_options, validate_component_name, DirectiveDef, FilterFn, OptionValue,
    RawOptions,
};

static NEXT_DEFINITION_ID: AtomicU64 = AtomicU64::new(1);

/// A plugin, installed once per [`Definition`] tree (spec §6: `use(plugin,
/// ...args)` is idempotent).
pub trait Plugin {
    fn install(&self, def: &Rc<Definition>);
}

/// A component definition: a sealed, merged option record plus enough
/// history (`super_def`, `extend_options`, a snapshot of the superclass's
/// options as of last resolution) to replay later global mixins, per
/// spec §4.4's "Constructor option resolution".
pub struct Definition {
    id: u64,
    super_def: Option<Rc<Definition>>,
    sealed_options: RefCell<Rc<RawOptions>>,
    extend_options: Rc<RawOptions>,
    super_snapshot: RefCell<Option<Rc<RawOptions>>>,
    extend_cache: RefCell<HashMap<usize, Rc<Definition>>>,
    installed_plugins: RefCell<Vec<usize>>,
}

impl Definition {
    /// Creates a root definition with no superclass (spec §6's top-level
    /// `new Root(options)` entry point, prior to any instance existing).
    pub fn root(options: RawOptions) -> Rc<Definition> {
        Rc::new(Definition {
            id: NEXT_DEFINITION_ID.fetch_add(1, Ordering::Relaxed),
            super_def: None,
            sealed_options: RefCell::new(Rc::new(options.clone())),
            extend_options: Rc::new(options),
            super_snapshot: RefCell::new(None),
            extend_cache: RefCell::new(HashMap::new()),
            installed_plugins: RefCell::new(Vec::new()),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current sealed options, recomputing from `extend_options`
    /// if the superclass's own sealed options have changed since this
    /// definition last resolved them — the mechanism by which a later
    /// `Class.mixin()` on a global/root definition reaches subclasses that
    /// were `extend()`-ed before the mixin was applied (spec §4.4).
    ///
    /// This recomputes by fully re-merging rather than computing Vue's
    /// precise key-level diff; `merge_options`'s hook de-duplication by
    /// closure identity keeps repeated re-merges from duplicating lifecycle
    /// hooks. See `DESIGN.md` for this tradeoff.
    pub fn options(self: &Rc<Self>) -> Rc<RawOptions> {
        if let Some(super_def) = &self.super_def {
            let current_super = super_def.options();
            let stale = match &*self.super_snapshot.borrow() {
                Some(snapshot) => !Rc::ptr_eq(snapshot, &current_super),
                None => true,
            };
            if stale {
                let merged = merge_options(&current_super, &self.extend_options, false);
                *self.sealed_options.borrow_mut() = Rc::new(merged);
                *self.super_snapshot.borrow_mut() = Some(current_super);
            }
        }
        self.sealed_options.borrow().clone()
    }

    /// `Class.mixin(options)`: `Class.options = mergeOptions(Class.options,
    /// options)` (spec §6), applied in place to this definition.
    pub fn mixin(self: &Rc<Self>, options: Rc<RawOptions>) {
        let current = self.options();
        let merged = merge_options(&current, &options, false);
        *self.sealed_options.borrow_mut() = Rc::new(merged);
    }

    /// `Class.extend(options)`: returns a subclass with merged, sealed
    /// options, caching per (this definition, `options`) pair keyed by the
    /// `options` `Rc`'s identity (spec §6).
    pub fn extend(self: &Rc<Self>, options: Rc<RawOptions>) -> Rc<Definition> {
        let key = Rc::as_ptr(&options) as usize;
        if let Some(cached) = self.extend_cache.borrow().get(&key) {
            return cached.clone();
        }
        let super_options = self.options();
        let sealed = merge_options(&super_options, &options, false);
        let child = Rc::new(Definition {
            id: NEXT_DEFINITION_ID.fetch_add(1, Ordering::Relaxed),
            super_def: Some(self.clone()),
            sealed_options: RefCell::new(Rc::new(sealed)),
            extend_options: options,
            super_snapshot: RefCell::new(Some(super_options)),
            extend_cache: RefCell::new(HashMap::new()),
            installed_plugins: RefCell::new(Vec::new()),
        });
        self.extend_cache.borrow_mut().insert(key, child.clone());
        child
    }

    /// `use(plugin, ...)`: idempotent per definition (spec §6).
    pub fn use_plugin(self: &Rc<Self>, plugin: Rc<dyn Plugin>) {
        let key = Rc::as_ptr(&plugin) as *const () as usize;
        if self.installed_plugins.borrow().contains(&key) {
            return;
        }
        self.installed_plugins.borrow_mut().push(key);
        plugin.install(self);
    }

    /// `component(id, def?)`: registers (if `def` is `Some`) or fetches (if
    /// `None`) a component definition. Returns the registered/looked-up
    /// definition, or `None` if registration was rejected for an invalid
    /// name.
    pub fn component(self: &Rc<Self>, id: &str, def: Option<Rc<Definition>>) -> Option<Rc<Definition>> {
        match def {
            Some(def) => {
                if validate_component_name(id).is_err() {
                    return None;
                }
                self.mutate_options(|opts| {
                    opts.components.insert(id.to_string(), def.clone());
                });
                Some(def)
            }
            None => self.options().components.get(id).cloned(),
        }
    }

    pub fn directive(self: &Rc<Self>, id: &str, def: Option<DirectiveDef>) -> Option<DirectiveDef> {
        match def {
            Some(def) => {
                self.mutate_options(|opts| {
                    opts.directives.insert(id.to_string(), def.clone());
                });
                Some(def)
            }
            None => self.options().directives.get(id).cloned(),
        }
    }

    pub fn filter(self: &Rc<Self>, id: &str, def: Option<FilterFn>) -> Option<FilterFn> {
        match def {
            Some(def) => {
                self.mutate_options(|opts| {
                    opts.filters.insert(id.to_string(), def.clone());
                });
                Some(def)
            }
            None => self.options().filters.get(id).cloned(),
        }
    }

    fn mutate_options(self: &Rc<Self>, f: impl FnOnce(&mut RawOptions)) {
        let mut opts = self.options().as_ref().clone();
        f(&mut opts);
        *self.sealed_options.borrow_mut() = Rc::new(opts);
    }

    /// Builds a new instance from this definition (the `new Root(options)`/
    /// `new SubComponent(options)` entry point).
    pub fn instantiate(
        self: &Rc<Self>,
        props_data: HashMap<String, Value>,
        parent: Option<Rc<Instance>>,
        parent_listeners: Vec<ParentListener>,
    ) -> Rc<Instance> {
        Instance::new(self.options(), props_data, parent, parent_listeners)
    }

    /// `Class.set(target, key, value)`: mirrors [`Instance::set`] at class
    /// scope (spec §6).
    pub fn set(target: &Value, key: &str, value: Value) {
        Instance::set(target, key, value);
    }

    /// `Class.delete(target, key)`.
    pub fn delete(target: &Value, key: &str) {
        Instance::delete(target, key);
    }

    /// `Class.observable(obj)`: wraps a plain JSON value as a reactive
    /// [`Value`] tree outside of any instance.
    pub fn observable(json: &OptionValue) -> Value {
        json_to_reactive(json)
    }
}
