//! Option merging and instance initialization for the wisp reactive
//! component runtime.
//!
//! This crate sits one layer above `wisp-reactive`: it takes the
//! hierarchical option records a component definition accumulates through
//! `extends`/`mixins` (spec §3, §4.4), merges them with a per-key strategy
//! table, and uses the merged record to build an [`instance::Instance`] —
//! props, data, computed, methods, watch, provide/inject, and an event bus
//! — on top of `wisp-reactive`'s `Dep`/`Watcher`/`Value` primitives.
//!
//! Rendering, DOM patching, and the template compiler live in
//! `wisp-template`/the (out-of-scope) downstream code generator; this crate
//! never references either.

pub mod config;
pub mod definition;
pub mod error;
pub mod events;
pub mod instance;
pub mod options;
pub mod props;

pub use config::{GlobalConfig, Mode};
pub use definition::{Definition, Plugin};
pub use error::CoreError;
pub use events::EventBus;
pub use instance::{eval_path, Instance, ParentListener};

#[cfg(test)]
mod tests {
    use super::*;
    use options::{Hook, RawOptions};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn reset() {
        config::GlobalConfig::reset_for_tests();
    }

    #[test]
    fn lifecycle_hooks_concatenate_preserving_order() {
        reset();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_a = log.clone();
        let log_b = log.clone();
        let parent = RawOptions::new().with_hook(Hook::Created, move |_| log_a.borrow_mut().push("parent"));
        let child = RawOptions::new().with_hook(Hook::Created, move |_| log_b.borrow_mut().push("child"));
        let merged = options::merge_options(&parent, &child, false);
        let hooks = merged.hooks.get(&Hook::Created).cloned().unwrap_or_default();
        assert_eq!(hooks.len(), 2);
        for f in &hooks {
            f(&dummy_instance());
        }
        assert_eq!(*log.borrow(), vec!["parent", "child"]);
    }

    #[test]
    fn merging_same_canonical_records_is_idempotent() {
        reset();
        let parent = RawOptions::new().with_name("base");
        let child = RawOptions::new();
        let once = options::merge_options(&parent, &child, false);
        let twice = options::merge_options(&once, &RawOptions::new(), false);
        assert_eq!(once.name, twice.name);
        assert_eq!(once.hooks.len(), twice.hooks.len());
    }

    #[test]
    fn data_strategy_without_instance_is_a_composed_thunk() {
        reset();
        let parent =
            RawOptions::new().with_data(|_| serde_json::json!({"a": 1, "b": {"x": 1}}));
        let child = RawOptions::new().with_data(|_| serde_json::json!({"b": {"y": 2}, "c": 3}));
        let merged = options::merge_options(&parent, &child, false);
        let factory = merged.data.expect("data factory should survive the merge");
        let result = factory(&dummy_instance());
        assert_eq!(
            result,
            serde_json::json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3})
        );
    }

    fn dummy_instance() -> Rc<Instance> {
        Definition::root(RawOptions::new()).instantiate(Default::default(), None, Vec::new())
    }
}
