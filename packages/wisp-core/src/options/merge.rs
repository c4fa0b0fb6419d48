//! `mergeOptions` (spec §4.4): reduces a child option record against its
//! parent using the per-key strategy table, after first folding `extends`
//! and `mixins` into the parent.

use std::rc::Rc;

use crate::config::GlobalConfig;
use crate::options::raw::RawOptions;
use crate::options::value::deep_merge;

/// Merges `parent` and `child` into a new canonical [`RawOptions`], per
/// spec §4.4. `has_instance` mirrors the optional `vm` argument to the real
/// `mergeOptions`: some keys (`el`, `propsData`) are only honored when an
/// instance is actually being constructed, not when merging two component
/// definitions together.
///
/// `child.extends`/`child.mixins` are folded into `parent` first, each via
/// a recursive `merge_options` call, exactly as spec §4.4 describes — this
/// crate always performs that fold rather than tracking a "this record is
/// already merged/sealed" sentinel (spec.md's `_base`), since every call
/// site in this crate controls how many times a given pair is merged; see
/// `DESIGN.md` for this tradeoff.
pub fn merge_options(parent: &RawOptions, child: &RawOptions, has_instance: bool) -> RawOptions {
    let mut base = parent.clone();
    if let Some(extends) = &child.extends {
        base = merge_options(&base, extends, has_instance);
    }
    for mixin in &child.mixins {
        base = merge_options(&base, mixin, has_instance);
    }
    merge_flat(&base, child, has_instance)
}

/// The per-key pass, assuming `extends`/`mixins` have already been folded
/// into `parent`.
fn merge_flat(parent: &RawOptions, child: &RawOptions, has_instance: bool) -> RawOptions {
    let mut out = RawOptions::new();

    out.name = child.name.clone().or_else(|| parent.name.clone());

    if has_instance {
        out.el = child.el.clone().or_else(|| parent.el.clone());
        out.props_data = child.props_data.clone().or_else(|| parent.props_data.clone());
    } else {
        if child.el.is_some() || child.props_data.is_some() {
            GlobalConfig::warn("`el`/`propsData` are only valid on an instance, not a component definition");
        }
        out.props_data = parent.props_data.clone();
        out.el = parent.el.clone();
    }

    // props / methods / inject / computed: shallow merge, child wins.
    out.props = parent.props.clone();
    out.props.extend(child.props.clone());

    out.methods = parent.methods.clone();
    out.methods.extend(child.methods.clone());

    out.inject = parent.inject.clone();
    out.inject.extend(child.inject.clone());

    out.computed = parent.computed.clone();
    out.computed.extend(child.computed.clone());

    // data / provide: compose into a thunk that deep-merges both outputs.
    out.data = merge_data_like(&parent.data, &child.data);
    out.provide = merge_data_like(&parent.provide, &child.provide);

    // watch: per-key array concatenation.
    out.watch = parent.watch.clone();
    for (key, defs) in &child.watch {
        out.watch.entry(key.clone()).or_default().extend(defs.clone());
    }

    // components / directives / filters: parent as base, child entries on
    // top (spec's "new object with parent as prototype chain" collapses to
    // a plain overriding merge since there's no live prototype chain here).
    out.components = parent.components.clone();
    out.components.extend(child.components.clone());

    out.directives = parent.directives.clone();
    out.directives.extend(child.directives.clone());

    out.filters = parent.filters.clone();
    out.filters.extend(child.filters.clone());

    // lifecycle hooks: concatenate, de-duplicating by closure identity.
    out.hooks = parent.hooks.clone();
    for (hook, fns) in &child.hooks {
        let entry = out.hooks.entry(*hook).or_default();
        for f in fns {
            if !entry.iter().any(|existing| Rc::ptr_eq(existing, f)) {
                entry.push(f.clone());
            }
        }
    }

    // custom: default `child ?? parent` per key.
    out.custom = parent.custom.clone();
    out.custom.extend(child.custom.clone());

    // mixins/extends don't survive into the merged record; they've been
    // folded into `parent` by the caller.
    out.mixins = Vec::new();
    out.extends = None;

    out
}

fn merge_data_like(
    parent: &Option<crate::options::raw::DataFactory>,
    child: &Option<crate::options::raw::DataFactory>,
) -> Option<crate::options::raw::DataFactory> {
    match (parent.clone(), child.clone()) {
        (None, None) => None,
        (Some(p), None) => Some(p),
        (None, Some(c)) => Some(c),
        (Some(p), Some(c)) => Some(Rc::new(move |vm| {
            let parent_val = p(vm);
            let child_val = c(vm);
            deep_merge(&parent_val, &child_val)
        })),
    }
}
