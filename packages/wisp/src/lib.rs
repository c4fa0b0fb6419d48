//! The wisp reactive component runtime core.
//!
//! This crate is a thin facade over three layers that can otherwise be used
//! independently:
//!
//! - [`wisp_reactive`] — the dependency-tracking graph (`Dep`/`Watcher`) and
//!   the dynamically-typed observed [`wisp_reactive::Value`] tree.
//! - [`wisp_core`] — option merging (`extends`/`mixins`) and instance
//!   lifecycle: props, data, computed, methods, watch, provide/inject, and
//!   an event bus, built on top of `wisp_reactive`.
//! - [`wisp_template`] — a streaming HTML/text template scanner and static
//!   optimizer, used independently of the other two layers.
//!
//! Virtual-DOM diffing, DOM patching, code generation, SSR, `$mount`, and
//! devtools integration are out of scope for this crate; it stops at the
//! boundary where a downstream renderer would take the compiled template
//! and a live [`wisp_core::Instance`] and start patching a real DOM.
//!
//! Most consumers only need [`prelude`].

pub use wisp_core;
pub use wisp_reactive;
pub use wisp_template;

/// Re-exports of the types most component-runtime code reaches for.
pub mod prelude {
    pub use wisp_core::{
        eval_path, CoreError, Definition, EventBus, GlobalConfig, Instance, Mode, ParentListener,
        Plugin,
    };
    pub use wisp_reactive::{
        batch, untracked, Dep, ReactiveError, Value, Watcher, WatcherOptions,
    };
    pub use wisp_template::{
        mark_static, mark_static_roots, parse_html, parse_text, AstElement, AstNode, AstText,
        HtmlParserOptions, HtmlSink, IfCondition, ParseError, RawToken, TextParseResult,
    };
}
