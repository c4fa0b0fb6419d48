//! The per-key merge strategy table (spec §4.4).
//!
//! The table itself only governs `custom` (user-extension) keys: every
//! well-known key has its merge rule inlined in [`super::merge::merge_options`]
//! because each needs a different concrete return type (a dep-free thunk for
//! `data`, a `Vec` for lifecycle hooks, …) that a `HashMap<OptionKey, dyn
//! Fn>` can't express without boxing everything as `OptionValue`. The table
//! still exists as the single place that answers "what strategy applies to
//! key X", matching the redesign note's `Map<OptionKey, MergeStrategy>`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::key::{Hook, OptionKey};

/// One of the merge behaviors §4.4's table assigns to option keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// `child ?? parent`.
    Default,
    /// Thunk that deep-merges both factories' output at access time.
    DataLike,
    /// Concatenate parent then child, de-duplicating by reference identity.
    Concat,
    /// Parent-as-prototype object, child entries merged on top.
    Prototype,
    /// Per-key array concatenation.
    Watch,
    /// Shallow merge, child wins per-key.
    Shallow,
    /// Only meaningful when an instance is present.
    InstanceOnly,
}

static STRATEGY_TABLE: Lazy<HashMap<OptionKey, MergeStrategy>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(OptionKey::Data, MergeStrategy::DataLike);
    table.insert(OptionKey::Provide, MergeStrategy::DataLike);
    for hook in Hook::ALL {
        table.insert(OptionKey::LifecycleHook(hook), MergeStrategy::Concat);
    }
    table.insert(OptionKey::Components, MergeStrategy::Prototype);
    table.insert(OptionKey::Directives, MergeStrategy::Prototype);
    table.insert(OptionKey::Filters, MergeStrategy::Prototype);
    table.insert(OptionKey::Watch, MergeStrategy::Watch);
    table.insert(OptionKey::Props, MergeStrategy::Shallow);
    table.insert(OptionKey::Methods, MergeStrategy::Shallow);
    table.insert(OptionKey::Inject, MergeStrategy::Shallow);
    table.insert(OptionKey::Computed, MergeStrategy::Shallow);
    table.insert(OptionKey::El, MergeStrategy::InstanceOnly);
    table.insert(OptionKey::PropsData, MergeStrategy::InstanceOnly);
    table
});

/// Looks up the strategy for a well-known key, or [`MergeStrategy::Default`]
/// for anything not in the table (including every `Custom` key, per §4.4's
/// "Defaults: `child ?? parent`").
pub fn strategy_for(key: &OptionKey) -> MergeStrategy {
    STRATEGY_TABLE
        .get(key)
        .copied()
        .unwrap_or(MergeStrategy::Default)
}

