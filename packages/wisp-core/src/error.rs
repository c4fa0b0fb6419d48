//! Errors the option merger and instance initializer can run into.
//!
//! As in `wisp-reactive`, nothing here is ever unwound out of the public
//! API: every variant is constructed and handed to [`crate::config::GlobalConfig`]'s
//! warn/error sinks, matching spec §7's "nothing in the core throws"
//! discipline.

use thiserror::Error;

/// Conditions spec §7 says are routed to development warnings rather than a
/// hard failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The same key was declared in more than one of `data`/`props`/`methods`/
    /// `computed` on the same instance. The later definition wins, per the
    /// order in spec §4.5.
    #[error("duplicate definition of {key:?} in both {first} and {second}")]
    DuplicateOptionDefinition {
        key: String,
        first: &'static str,
        second: &'static str,
    },
    /// A `components` entry used a name that collides with a reserved or
    /// built-in HTML tag.
    #[error("do not use built-in or reserved HTML elements as component id: {0:?}")]
    ReservedComponentName(String),
    /// An `inject` key had no matching `provide` in any ancestor and no
    /// default value.
    #[error("injection {0:?} not found")]
    MissingInjection(String),
    /// A write was attempted against a read-only instance surface
    /// (`$data`, `$props`, a computed property with no setter, or a prop on
    /// a non-root instance).
    #[error("{target} is readonly")]
    ReadonlyWrite { target: &'static str },
    /// A prop failed its type check, `required` check, or custom validator.
    #[error("invalid prop {prop:?}: {reason}")]
    PropValidationFailed { prop: String, reason: String },
    /// `mergeOptions` was given a shape it couldn't normalize (e.g. a
    /// `props` entry that is neither a string, a constructor, nor a
    /// descriptor object).
    #[error("invalid option shape for {key:?}: {reason}")]
    InvalidOptionShape { key: String, reason: String },
}
