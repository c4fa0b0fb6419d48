//! Option records and the merge algebra that reduces them (spec §3, §4.4).

mod key;
mod merge;
mod normalize;
mod raw;
mod strategy;
mod value;

pub use key::{Hook, OptionKey};
pub use merge::merge_options;
pub use normalize::{
    camelize, normalize_directive, normalize_inject, normalize_props, resolve_default,
    resolve_inject_default, validate_component_name, DirectiveInput, InjectInput, InjectsInput,
    PropInput, PropsInput,
};
pub use raw::{
    ComputedDef, ComputedGetter, ComputedSetter, DataFactory, DirectiveDef, FilterFn, HookFn,
    InjectDefault, InjectSpec, MethodFn, PropDef, PropDefault, PropType, RawOptions, WatchCallback,
    WatchDef,
};
pub use strategy::{strategy_for, MergeStrategy};
pub use value::{deep_merge, json_to_reactive, reactive_to_json, OptionValue};
