//! Element/text node shapes (spec §3), carrying the optimizer fields spec
//! §4.11 reads and writes (`static`, `staticRoot`, `staticInFor`,
//! `ifConditions`, `for`).
//!
//! The HTML scanner in [`crate::html`] is callback-based and never builds
//! this tree itself — building an AST from the `start`/`end`/`chars`/
//! `comment` event stream is the (out-of-scope) downstream compiler's job,
//! per spec §4.11's "AST builder itself is assumed upstream". These types
//! exist so the optimizer in [`crate::optimizer`] has something concrete to
//! operate on, and so tests can build small trees by hand.

use std::collections::HashMap;

/// One branch of a `v-if`/`v-else-if`/`v-else` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IfCondition {
    /// The branch's guard expression; `None` for a trailing `v-else`.
    pub condition: Option<String>,
    pub block: Box<AstNode>,
}

/// An element node (spec §3's "AST builder" output shape).
#[derive(Debug, Clone, PartialEq)]
pub struct AstElement {
    pub tag: String,
    /// Attributes in source order, as the scanner produced them.
    pub attrs_list: Vec<(String, String)>,
    /// The same attributes keyed for lookup.
    pub attrs_map: HashMap<String, String>,
    /// `true` for an element with no directive/special attribute handling,
    /// i.e. one that can be rendered via the plain-`createElement` fast
    /// path rather than a generated data object.
    pub plain: bool,
    /// Whether any attribute is a dynamic binding (`:attr`/`v-bind:attr`)
    /// rather than a plain string attribute — spec §4.11's "no dynamic
    /// bindings" static-eligibility check. Our AST builder is out of
    /// scope, so this is set directly rather than inferred from attribute
    /// name syntax.
    pub has_bindings: bool,
    /// Set for an element receiving scoped-slot content — never promoted
    /// to static regardless of its own shape (spec §4.11).
    pub has_slot_scope: bool,
    pub children: Vec<AstNode>,
    pub start: usize,
    pub end: usize,

    /// `v-pre`: skip compilation for this subtree entirely.
    pub v_pre: bool,
    /// `v-if`'s guard expression, if present on this element.
    pub v_if: Option<String>,
    /// `v-for="item in expr"` (stored as the raw right-hand expression).
    pub for_: Option<String>,

    /// Filled in by [`crate::optimizer::mark_static`]; `None` before the
    /// optimizer has visited this node.
    pub static_: Option<bool>,
    /// Filled in by [`crate::optimizer::mark_static_roots`].
    pub static_root: Option<bool>,
    /// Whether this (static) node sits inside a `v-for`.
    pub static_in_for: bool,
    /// Non-empty only on the first branch of a `v-if` chain; subsequent
    /// branches are folded into this list rather than kept as siblings.
    pub if_conditions: Vec<IfCondition>,
}

impl AstElement {
    pub fn new(tag: impl Into<String>) -> Self {
        AstElement {
            tag: tag.into(),
            attrs_list: Vec::new(),
            attrs_map: HashMap::new(),
            plain: true,
            has_bindings: false,
            has_slot_scope: false,
            children: Vec::new(),
            start: 0,
            end: 0,
            v_pre: false,
            v_if: None,
            for_: None,
            static_: None,
            static_root: None,
            static_in_for: false,
            if_conditions: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        self.plain = false;
        self.attrs_map.insert(name.clone(), value.clone());
        self.attrs_list.push((name, value));
        self
    }

    pub fn with_child(mut self, child: AstNode) -> Self {
        self.children.push(child);
        self
    }

    /// Marks this element as having at least one dynamic attribute binding
    /// (spec §4.11's static-eligibility check).
    pub fn with_binding(mut self) -> Self {
        self.has_bindings = true;
        self.plain = false;
        self
    }

    pub fn with_for(mut self, expr: impl Into<String>) -> Self {
        self.for_ = Some(expr.into());
        self.plain = false;
        self
    }

    pub fn with_if(mut self, expr: impl Into<String>) -> Self {
        self.v_if = Some(expr.into());
        self.plain = false;
        self
    }

    pub fn with_v_pre(mut self) -> Self {
        self.v_pre = true;
        self
    }

    pub fn with_slot_scope(mut self) -> Self {
        self.has_slot_scope = true;
        self
    }
}

/// A text node, either plain or interpolated (spec §4.10's token output).
#[derive(Debug, Clone, PartialEq)]
pub struct AstText {
    /// The raw source text.
    pub text: String,
    /// `Some` when [`crate::text::parse_text`] found `{{ }}` interpolation;
    /// `isStatic(node)` is `false` whenever this is `Some` (spec §4.11).
    pub expression: Option<String>,
}

impl AstText {
    pub fn plain(text: impl Into<String>) -> Self {
        AstText {
            text: text.into(),
            expression: None,
        }
    }

    pub fn dynamic(text: impl Into<String>, expression: impl Into<String>) -> Self {
        AstText {
            text: text.into(),
            expression: Some(expression.into()),
        }
    }

    pub fn is_static(&self) -> bool {
        self.expression.is_none()
    }
}

/// A node in the AST produced upstream of the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Element(AstElement),
    Text(AstText),
}

impl AstNode {
    pub fn as_element(&self) -> Option<&AstElement> {
        match self {
            AstNode::Element(el) => Some(el),
            AstNode::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut AstElement> {
        match self {
            AstNode::Element(el) => Some(el),
            AstNode::Text(_) => None,
        }
    }

    pub fn is_static(&self) -> Option<bool> {
        match self {
            AstNode::Element(el) => el.static_,
            AstNode::Text(text) => Some(text.is_static()),
        }
    }
}
