//! [`RawOptions`], the in-memory shape of a component's option record after
//! the raw user input has been normalized but before it has been merged
//! against a parent (spec §3's "Option record", §4.4).
//!
//! Because this is Rust rather than a dynamically-typed host language, the
//! "raw user value" that spec.md describes is a typed enum per field instead
//! of an arbitrary object shape; normalization (§4.4's three preprocessed
//! shapes) converts user-facing input enums into the canonical maps stored
//! here.

use std::collections::HashMap;
use std::rc::Rc;

use wisp_reactive::Value;

use crate::instance::Instance;
use crate::options::key::Hook;
use crate::options::value::OptionValue;

/// `data()`/`provide()` factory, always a function of the (partially
/// constructed) instance so it can read props already assigned to `this`,
/// matching spec §4.4's "Return a thunk that, at access time, invokes both
/// functions". Operates on plain [`OptionValue`] trees rather than already-
/// reactive [`Value`]s so the `DataLike` merge strategy can deep-merge two
/// factories' output with plain-data semantics before the result is made
/// reactive at instance-init time.
pub type DataFactory = Rc<dyn Fn(&Instance) -> OptionValue>;

/// A bound instance method: `(self, args) -> return value`.
pub type MethodFn = Rc<dyn Fn(&Instance, &[Value]) -> Value>;

/// A computed property's getter.
pub type ComputedGetter = Rc<dyn Fn(&Instance) -> Value>;
/// A computed property's optional setter.
pub type ComputedSetter = Rc<dyn Fn(&Instance, Value)>;

/// One `computed` entry: a getter plus an optional setter (spec §4.6).
#[derive(Clone)]
pub struct ComputedDef {
    pub get: ComputedGetter,
    pub set: Option<ComputedSetter>,
}

/// A `watch` callback: `(self, new, old)`.
pub type WatchCallback = Rc<dyn Fn(&Instance, &Value, &Value)>;

/// One `watch` entry, after normalization. Several of these can exist per
/// key once parent and child entries are concatenated (spec §4.4's `watch`
/// strategy).
#[derive(Clone)]
pub struct WatchDef {
    pub handler: WatchCallback,
    pub deep: bool,
    pub immediate: bool,
    pub sync: bool,
}

/// A declared type for a `prop`, compared against the runtime [`Value`]
/// variant the way spec §4.7 compares `typeof` against `Function.name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Function,
}

/// A prop's default value, either a constant or (required for `Object`/
/// `Array` types per spec §4.7) a factory invoked fresh per instance.
#[derive(Clone)]
pub enum PropDefault {
    Value(OptionValue),
    Factory(Rc<dyn Fn() -> OptionValue>),
}

/// One declared `prop`, after normalization to the full-descriptor shape
/// (spec §4.4's props normalization, §4.7's validation fields).
#[derive(Clone, Default)]
pub struct PropDef {
    pub types: Vec<PropType>,
    pub required: bool,
    pub default: Option<PropDefault>,
    pub validator: Option<Rc<dyn Fn(&Value) -> bool>>,
}

/// An `inject` entry's default, mirroring [`PropDefault`].
#[derive(Clone)]
pub enum InjectDefault {
    Value(OptionValue),
    Factory(Rc<dyn Fn() -> OptionValue>),
}

/// One declared `inject`, after normalization (spec §4.4).
#[derive(Clone)]
pub struct InjectSpec {
    pub from: String,
    pub default: Option<InjectDefault>,
}

/// A custom directive's `bind`/`update` hooks (spec §4.4's directive
/// normalization: a bare function becomes `{bind: fn, update: fn}`).
#[derive(Clone)]
pub struct DirectiveDef {
    pub bind: Option<Rc<dyn Fn(&Instance, &Value)>>,
    pub update: Option<Rc<dyn Fn(&Instance, &Value, &Value)>>,
}

/// A registered filter function: `(input, ..args) -> output`.
pub type FilterFn = Rc<dyn Fn(&[Value]) -> Value>;

/// A lifecycle hook callback.
pub type HookFn = Rc<dyn Fn(&Instance)>;

/// The canonical, normalized shape of a component's option record (spec §3's
/// "Option record"). Every field here has already gone through whatever
/// normalization its raw user shape required; merging two `RawOptions`
/// (parent, child) per spec §4.4 produces a third.
#[derive(Clone, Default)]
pub struct RawOptions {
    pub name: Option<String>,
    pub el: Option<String>,
    pub props: HashMap<String, PropDef>,
    pub props_data: Option<HashMap<String, Value>>,
    pub data: Option<DataFactory>,
    pub computed: HashMap<String, ComputedDef>,
    pub methods: HashMap<String, MethodFn>,
    pub watch: HashMap<String, Vec<WatchDef>>,
    pub provide: Option<DataFactory>,
    pub inject: HashMap<String, InjectSpec>,
    pub components: HashMap<String, Rc<crate::definition::Definition>>,
    pub directives: HashMap<String, DirectiveDef>,
    pub filters: HashMap<String, FilterFn>,
    pub mixins: Vec<Rc<RawOptions>>,
    pub extends: Option<Rc<RawOptions>>,
    pub hooks: HashMap<Hook, Vec<HookFn>>,
    /// Options outside the well-known set, kept as plain data (spec §4.4's
    /// default `child ?? parent` strategy).
    pub custom: HashMap<String, OptionValue>,
}

impl RawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_data(mut self, factory: impl Fn(&Instance) -> OptionValue + 'static) -> Self {
        self.data = Some(Rc::new(factory));
        self
    }

    pub fn with_provide(mut self, factory: impl Fn(&Instance) -> OptionValue + 'static) -> Self {
        self.provide = Some(Rc::new(factory));
        self
    }

    pub fn with_method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Instance, &[Value]) -> Value + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(f));
        self
    }

    pub fn with_computed(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&Instance) -> Value + 'static,
    ) -> Self {
        self.computed.insert(
            name.into(),
            ComputedDef {
                get: Rc::new(get),
                set: None,
            },
        );
        self
    }

    pub fn with_computed_writable(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&Instance) -> Value + 'static,
        set: impl Fn(&Instance, Value) + 'static,
    ) -> Self {
        self.computed.insert(
            name.into(),
            ComputedDef {
                get: Rc::new(get),
                set: Some(Rc::new(set)),
            },
        );
        self
    }

    pub fn with_watch(mut self, key: impl Into<String>, def: WatchDef) -> Self {
        self.watch.entry(key.into()).or_default().push(def);
        self
    }

    pub fn with_hook(mut self, hook: Hook, f: impl Fn(&Instance) + 'static) -> Self {
        self.hooks.entry(hook).or_default().push(Rc::new(f));
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, def: PropDef) -> Self {
        self.props.insert(name.into(), def);
        self
    }

    pub fn with_inject(mut self, key: impl Into<String>, spec: InjectSpec) -> Self {
        self.inject.insert(key.into(), spec);
        self
    }

    pub fn with_mixin(mut self, mixin: Rc<RawOptions>) -> Self {
        self.mixins.push(mixin);
        self
    }

    pub fn with_extends(mut self, base: Rc<RawOptions>) -> Self {
        self.extends = Some(base);
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        self.custom.insert(key.into(), value);
        self
    }
}
