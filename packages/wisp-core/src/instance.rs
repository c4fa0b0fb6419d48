//! The component instance (spec §3's "Instance", §4.5's initialization
//! order, §4.6's computed accessor).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wisp_reactive::{with_observation_suppressed, Value, Watcher, WatcherOptions, WatcherRegistry};

use crate::config::GlobalConfig;
use crate::error::CoreError;
use crate::events::EventBus;
use crate::options::{
    json_to_reactive, reactive_to_json, Hook, InjectDefault, RawOptions, WatchCallback,
};
use crate::props::validate_props;

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A listener a parent attached to a child's root element, installed on the
/// child's event bus during init step 4 (spec §4.5).
pub type ParentListener = (String, Rc<dyn Fn(&[Value])>);

/// A component's runtime object (spec §3's "Instance").
pub struct Instance {
    uid: u64,
    /// Always `true`; mirrors the host framework's `_isVue` sentinel, used
    /// so other code can recognize "this Rc is an Instance" without a
    /// downcast (spec §3).
    is_root_marker: Cell<bool>,
    options: RefCell<Rc<RawOptions>>,
    data: RefCell<Value>,
    props: RefCell<HashMap<String, Value>>,
    computed_watchers: RefCell<HashMap<String, Watcher<Value>>>,
    watchers: RefCell<WatcherRegistry<Value>>,
    events: Rc<EventBus>,
    provided: RefCell<HashMap<String, Value>>,
    parent: RefCell<Option<Weak<Instance>>>,
    children: RefCell<Vec<Weak<Instance>>>,
    /// Names colliding between `data`/`props`/`methods`/`computed`; later
    /// definition wins per §4.5, tracked so duplicate warnings fire once.
    own_keys: RefCell<HashMap<String, &'static str>>,
}

impl Instance {
    /// Step-by-step instance construction following spec §4.5's numbered
    /// order exactly.
    pub fn new(
        options: Rc<RawOptions>,
        props_data: HashMap<String, Value>,
        parent: Option<Rc<Instance>>,
        parent_listeners: Vec<ParentListener>,
    ) -> Rc<Instance> {
        // 1. unique id, _isVue = true.
        let instance = Rc::new(Instance {
            uid: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            is_root_marker: Cell::new(true),
            options: RefCell::new(options.clone()),
            data: RefCell::new(Value::object(std::iter::empty::<(&str, Value)>())),
            props: RefCell::new(HashMap::new()),
            computed_watchers: RefCell::new(HashMap::new()),
            watchers: RefCell::new(WatcherRegistry::new()),
            events: Rc::new(EventBus::new()),
            provided: RefCell::new(HashMap::new()),
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            own_keys: RefCell::new(HashMap::new()),
        });

        // 3. lifecycle book-keeping: $parent/$root/$children.
        if let Some(parent) = &parent {
            *instance.parent.borrow_mut() = Some(Rc::downgrade(parent));
            parent.children.borrow_mut().push(Rc::downgrade(&instance));
        }

        // 4. initialize events from $options._parentListeners.
        for (name, handler) in parent_listeners {
            instance.events.on(name, handler);
        }

        // 5. render helpers: out of scope.

        // 6. beforeCreate.
        instance.run_hook(Hook::BeforeCreate);

        // 7. resolve inject, before props/data (spec §3: "inject is resolved
        // before them").
        instance.init_inject(&options);

        // 8. init state: props, methods, data, computed, watch.
        instance.init_props(&options, props_data);
        instance.init_methods(&options);
        instance.init_data(&options);
        instance.init_computed(&options);
        instance.init_watch(&options);

        // 9. provide, evaluated after data/props (spec §3).
        instance.init_provide(&options);

        // 10. created.
        instance.run_hook(Hook::Created);

        instance
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn is_instance(&self) -> bool {
        self.is_root_marker.get()
    }

    pub fn options(&self) -> Rc<RawOptions> {
        self.options.borrow().clone()
    }

    pub fn parent(&self) -> Option<Rc<Instance>> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Walks `$parent` links to the topmost instance.
    pub fn root(self: &Rc<Self>) -> Rc<Instance> {
        let mut current = self.clone();
        loop {
            match current.parent() {
                Some(p) => current = p,
                None => return current,
            }
        }
    }

    pub fn children(&self) -> Vec<Rc<Instance>> {
        self.children.borrow().iter().filter_map(Weak::upgrade).collect()
    }

    fn run_hook(&self, hook: Hook) {
        let hooks = self.options.borrow().hooks.get(&hook).cloned();
        if let Some(hooks) = hooks {
            for f in hooks {
                f(self);
            }
        }
    }

    fn claim_key(&self, key: &str, owner: &'static str) -> bool {
        let mut owners = self.own_keys.borrow_mut();
        if let Some(prev) = owners.get(key) {
            if *prev != owner {
                GlobalConfig::report_error(CoreError::DuplicateOptionDefinition {
                    key: key.to_string(),
                    first: prev,
                    second: owner,
                });
                GlobalConfig::warn(format!(
                    "the {owner} property {key:?} is already defined as a {prev}"
                ));
            }
        }
        let was_new = !owners.contains_key(key);
        owners.insert(key.to_string(), owner);
        was_new
    }

    // ---- inject (resolved before props/data) ----------------------------

    fn init_inject(&self, options: &RawOptions) {
        if options.inject.is_empty() {
            return;
        }
        with_observation_suppressed(|| {
            for (local, spec) in &options.inject {
                let mut found = None;
                let mut cursor = self.parent();
                while let Some(p) = cursor {
                    let provided = p.provided.borrow();
                    if let Some(v) = provided.get(&spec.from) {
                        found = Some(v.clone());
                        break;
                    }
                    drop(provided);
                    cursor = p.parent();
                }
                let value = found.or_else(|| {
                    spec.default.as_ref().map(|default| match default {
                        InjectDefault::Value(v) => json_to_reactive(v),
                        InjectDefault::Factory(f) => json_to_reactive(&f()),
                    })
                });
                match value {
                    Some(v) => {
                        self.data.borrow().set(local.clone(), v);
                    }
                    None => {
                        let err = CoreError::MissingInjection(spec.from.clone());
                        GlobalConfig::warn(err.to_string());
                        GlobalConfig::report_error(err);
                    }
                }
            }
        });
    }

    // ---- props ------------------------------------------------------------

    fn init_props(&self, options: &RawOptions, props_data: HashMap<String, Value>) {
        if options.props.is_empty() && props_data.is_empty() {
            return;
        }
        let mut previous_defaults = HashMap::new();
        let resolved = validate_props(&options.props, &props_data, &mut previous_defaults);
        for key in resolved.keys() {
            self.claim_key(key, "prop");
        }
        *self.props.borrow_mut() = resolved;
    }

    /// `$props.key` read. Read-only from the child's perspective; see
    /// [`Instance::set_prop_from_parent`] for the one writer allowed
    /// (re-render by the owning parent).
    pub fn prop(&self, key: &str) -> Option<Value> {
        self.props.borrow().get(key).cloned()
    }

    pub fn props_snapshot(&self) -> HashMap<String, Value> {
        self.props.borrow().clone()
    }

    /// Attempts to assign a prop directly on this instance, outside of the
    /// parent re-render path. Always a reported, dropped no-op (spec §3:
    /// "writing a prop on a non-root instance is a reported error").
    pub fn try_write_prop(&self, key: &str) {
        GlobalConfig::report_error(CoreError::ReadonlyWrite {
            target: "prop",
        });
        GlobalConfig::warn(format!(
            "avoid mutating a prop directly since the value will be overwritten whenever the \
             parent component re-renders: {key:?}"
        ));
    }

    // ---- methods ------------------------------------------------------------

    fn init_methods(&self, options: &RawOptions) {
        for key in options.methods.keys() {
            if key == "_" || key.starts_with('$') {
                GlobalConfig::warn(format!(
                    "method {key:?} conflicts with an existing instance property, consider \
                     renaming it"
                ));
                continue;
            }
            self.claim_key(key, "method");
        }
    }

    pub fn call_method(self: &Rc<Self>, name: &str, args: &[Value]) -> Option<Value> {
        let f = self.options.borrow().methods.get(name).cloned()?;
        Some(f(self, args))
    }

    // ---- data ------------------------------------------------------------

    fn init_data(&self, options: &RawOptions) {
        let Some(factory) = &options.data else {
            return;
        };
        // `pushTarget(None)` equivalent: don't let reading props/injects
        // inside the factory register dependencies on whatever happened to
        // be the active target (spec §4.5).
        let json = wisp_reactive::untracked(|| factory(self));
        let crate::options::OptionValue::Object(map) = &json else {
            GlobalConfig::warn("data() should return an object".to_string());
            return;
        };
        // Extend the instance's existing (possibly inject-populated, spec
        // §4.5 step 7) data object in place rather than replacing it
        // outright, so injected properties set before `data()` ran survive.
        let data = self.data.borrow();
        for key in map.keys() {
            self.claim_key(key, "data");
            data.set(key.clone(), json_to_reactive(&map[key]));
        }
    }

    /// `$data.key` / a proxied `instance.key` read, registering whatever
    /// dependency reading the underlying reactive property does.
    pub fn data_get(&self, key: &str) -> Value {
        self.data.borrow().get(key)
    }

    pub fn data_set(&self, key: &str, value: Value) {
        self.data.borrow().set(key.to_string(), value);
    }

    /// A full snapshot of `_data` as plain JSON, e.g. for `$data`.
    pub fn data_snapshot(&self) -> crate::options::OptionValue {
        reactive_to_json(&self.data.borrow())
    }

    // ---- computed ------------------------------------------------------------

    fn init_computed(self: &Rc<Self>, options: &RawOptions) {
        for (key, def) in &options.computed {
            self.claim_key(key, "computed");
            let vm = Rc::downgrade(self);
            let get = def.get.clone();
            let watcher: Watcher<Value> = Watcher::new(
                format!("computed:{key}"),
                move || {
                    let vm = vm.upgrade().expect("instance dropped while computed live");
                    get(&vm)
                },
                None,
                WatcherOptions {
                    lazy: true,
                    ..Default::default()
                },
            );
            self.computed_watchers.borrow_mut().insert(key.clone(), watcher);
        }
    }

    /// Reading a computed property (spec §4.6): re-evaluate if dirty, then
    /// `depend()` on each of its collected deps so the *caller's* watcher
    /// (not this computed) ends up subscribed directly to the inputs.
    pub fn computed_get(&self, key: &str) -> Option<Value> {
        let watcher = self.computed_watchers.borrow().get(key).cloned()?;
        let value = watcher.evaluate_if_dirty();
        watcher.depend_on_deps();
        Some(value)
    }

    /// Writing a computed property: permitted only if the definition
    /// supplied a setter (spec §4.6); otherwise dropped with a warning.
    pub fn computed_set(&self, key: &str, value: Value) {
        let setter = self
            .options
            .borrow()
            .computed
            .get(key)
            .and_then(|def| def.set.clone());
        match setter {
            Some(set) => set(self, value),
            None => {
                GlobalConfig::report_error(CoreError::ReadonlyWrite { target: "computed property" });
                GlobalConfig::warn(format!("computed property {key:?} was assigned to but it has no setter"));
            }
        }
    }

    pub fn has_computed(&self, key: &str) -> bool {
        self.computed_watchers.borrow().contains_key(key)
    }

    // ---- watch ------------------------------------------------------------

    fn init_watch(self: &Rc<Self>, options: &RawOptions) {
        for (key, defs) in &options.watch {
            for def in defs {
                self.watch_path(key.clone(), def.handler.clone(), def.deep, def.immediate, def.sync);
            }
        }
    }

    /// `$watch(exprOrFn, cb, opts)`. `path` is a dotted property path read
    /// off `_data`/`_props` (spec §4.2: "expression string compiled to a
    /// safe property-path accessor"); returns the `unwatch` closure.
    pub fn watch_path(
        self: &Rc<Self>,
        path: String,
        cb: WatchCallback,
        deep: bool,
        immediate: bool,
        sync: bool,
    ) -> Rc<dyn Fn()> {
        let vm = Rc::downgrade(self);
        let vm_for_getter = vm.clone();
        let path_for_getter = path.clone();
        let getter = move || {
            let vm = vm_for_getter.upgrade().expect("instance dropped while watcher live");
            eval_path(&vm, &path_for_getter)
        };

        let vm_for_cb = vm.clone();
        let cb_for_watcher = cb.clone();
        let watcher: Watcher<Value> = Watcher::new(
            format!("watch:{path}"),
            getter,
            Some(Box::new(move |new, old| {
                if let Some(vm) = vm_for_cb.upgrade() {
                    cb_for_watcher(&vm, new, old);
                }
            })),
            WatcherOptions {
                deep,
                sync,
                user: true,
                ..Default::default()
            },
        );

        if immediate {
            let value = watcher.evaluate_if_dirty();
            cb(self, &value, &value);
        }

        let key = self.watchers.borrow_mut().insert(watcher.clone());
        let watchers_for_unwatch = Rc::downgrade(self);
        Rc::new(move || {
            watcher.teardown();
            if let Some(vm) = watchers_for_unwatch.upgrade() {
                vm.watchers.borrow_mut().remove(key);
            }
        })
    }

    // ---- provide ------------------------------------------------------------

    fn init_provide(&self, options: &RawOptions) {
        let Some(factory) = &options.provide else {
            return;
        };
        let json = factory(self);
        if let crate::options::OptionValue::Object(map) = &json {
            let mut provided = self.provided.borrow_mut();
            for (k, v) in map {
                provided.insert(k.clone(), json_to_reactive(v));
            }
        } else {
            GlobalConfig::warn("provide() should return an object".to_string());
        }
    }

    // ---- events ------------------------------------------------------------

    pub fn on(&self, name: impl Into<String>, handler: Rc<dyn Fn(&[Value])>) {
        self.events.on(name, handler);
    }

    pub fn once(self: &Rc<Self>, name: impl Into<String>, handler: Rc<dyn Fn(&[Value])>) {
        self.events.once(name, handler);
    }

    pub fn off_all(&self) {
        self.events.off_all();
    }

    pub fn off_event(&self, name: &str) {
        self.events.off_event(name);
    }

    pub fn off(&self, name: &str, handler: &Rc<dyn Fn(&[Value])>) {
        self.events.off(name, handler);
    }

    pub fn emit(&self, name: &str, args: &[Value]) {
        self.events.emit(name, args);
    }

    // ---- $set / $delete ------------------------------------------------------

    /// `$set(target, key, value)` (spec §6): array-index aware.
    pub fn set(target: &Value, key: &str, value: Value) {
        if let Value::Array(_) = target {
            if let Ok(index) = key.parse::<usize>() {
                target.splice(index, 1, vec![value]);
                return;
            }
        }
        target.set(key.to_string(), value);
    }

    /// `$delete(target, key)`.
    pub fn delete(target: &Value, key: &str) {
        if let Value::Array(_) = target {
            if let Ok(index) = key.parse::<usize>() {
                target.splice(index, 1, Vec::new());
                return;
            }
        }
        target.del(key);
    }

    pub fn destroy(self: &Rc<Self>) {
        self.run_hook(Hook::BeforeDestroy);
        self.watchers.borrow_mut().teardown_all();
        for watcher in self.computed_watchers.borrow().values() {
            watcher.teardown();
        }
        self.events.off_all();
        self.run_hook(Hook::Destroyed);
    }
}

/// Evaluates a dotted property path (`"a.b.c"`) against an instance's
/// reactive surface (props first, then data, then computed), returning
/// [`Value::Null`] for any character sequence spec §4.2 doesn't consider a
/// safe path segment. Used both for `$watch("a.b.c", cb)` and for the
/// expression-string form of a user [`Watcher`] getter.
pub fn eval_path(instance: &Rc<Instance>, path: &str) -> Value {
    if !is_simple_path(path) {
        GlobalConfig::warn(format!("invalid watch path expression: {path:?}"));
        return Value::Null;
    }
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return Value::Null;
    };
    let mut current = read_root(instance, first);
    for segment in segments {
        current = current.get(segment);
    }
    current
}

fn read_root(instance: &Rc<Instance>, key: &str) -> Value {
    if let Some(v) = instance.prop(key) {
        return v;
    }
    if instance.has_computed(key) {
        return instance.computed_get(key).unwrap_or(Value::Null);
    }
    instance.data_get(key)
}

/// Spec §4.2: "any other character yields a no-op getter and a development
/// warning" — only dotted identifier paths are accepted.
fn is_simple_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .split('.')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'))
}
