//! Errors surfaced by the reactive engine.
//!
//! Nothing in this crate panics on user-triggerable conditions. These variants are
//! constructed and handed to a warning/error sink instead (see [`crate::runtime::set_error_handler`]).

use thiserror::Error;

/// Conditions the reactive engine can run into without a hard Rust panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReactiveError {
    /// A watcher's `update()` fired more times than the configured per-flush
    /// threshold within a single scheduler flush. The watcher is dropped from
    /// the queue for the remainder of the flush rather than looping forever.
    #[error("watcher exceeded {threshold} updates in a single flush, a possible infinite update loop was aborted for it")]
    WatcherCycleDetected {
        /// The configured threshold that was exceeded.
        threshold: u32,
    },
    /// An expression-string watcher used a path that isn't a sequence of
    /// dotted identifiers (e.g. contained `(`, `[`, or an operator).
    #[error("invalid property path expression: {0:?}")]
    InvalidExpressionPath(String),
    /// A signal, dep, or watcher was accessed after it was torn down.
    #[error("accessed a disposed reactive value")]
    Disposed,
    /// A `user: true` watcher's getter or callback unwound. Caught at the
    /// watcher boundary and routed here instead of propagating, per spec §7
    /// ("Errors from the callback are funneled through the instance error
    /// handler with context string").
    #[error("error in {context}")]
    UserCallbackPanicked {
        /// Where the panic was caught, e.g. `"watcher callback"` or
        /// `"watcher getter for \"total\""`.
        context: String,
    },
}
