//! The two-pass static optimizer (spec §4.11): marks subtrees that never
//! change so the (out-of-scope) code generator can hoist them out of the
//! per-render path.

use crate::ast::{AstElement, AstNode};
use crate::util::{is_built_in_tag, is_reserved_tag};

/// Pass 1. Marks every node's `static` flag, recursing depth-first so a
/// parent's flag always reflects its children's (spec §8 law 11:
/// "monotonic... a node marked non-static is never later flipped static
/// within the same pass" — we only ever write `false` once a child forces
/// it, never back the other way).
pub fn mark_static(node: &mut AstNode) {
    mark_static_inner(node, false);
}

fn mark_static_inner(node: &mut AstNode, within_template_for: bool) {
    let AstNode::Element(el) = node else {
        // Text nodes carry their static-ness directly via `expression`
        // (spec §4.11: plain text is static, interpolated text is not);
        // nothing to compute.
        return;
    };

    let mut is_static = is_static_candidate(el, within_template_for);
    let child_within_template_for = within_template_for || (el.tag == "template" && el.for_.is_some());

    for child in &mut el.children {
        mark_static_inner(child, child_within_template_for);
        if !child.is_static().unwrap_or(false) {
            is_static = false;
        }
    }
    for condition in &mut el.if_conditions {
        mark_static_inner(&mut condition.block, child_within_template_for);
        if !condition.block.is_static().unwrap_or(false) {
            is_static = false;
        }
    }

    el.static_ = Some(is_static);
}

fn is_static_candidate(el: &AstElement, within_template_for: bool) -> bool {
    if el.v_pre {
        return true;
    }
    if el.has_bindings
        || el.v_if.is_some()
        || el.for_.is_some()
        || is_built_in_tag(&el.tag)
        || !is_reserved_tag(&el.tag)
        || within_template_for
        || el.has_slot_scope
        || el.attrs_map.contains_key("inline-template")
    {
        return false;
    }
    true
}

/// Pass 2. Promotes static elements with more than a single plain-text
/// child to static roots, and threads `staticInFor` down through `v-for`
/// ancestors (spec §8 law 12: "a static root never has a single plain-text
/// child as its only child"). Must run after [`mark_static`].
pub fn mark_static_roots(node: &mut AstNode, is_in_for: bool) {
    let AstNode::Element(el) = node else {
        return;
    };

    if el.static_.unwrap_or(false) {
        el.static_in_for = is_in_for;
    }

    let single_static_text_child =
        el.children.len() == 1 && matches!(&el.children[0], AstNode::Text(t) if t.is_static());

    if el.static_.unwrap_or(false) && !el.children.is_empty() && !single_static_text_child {
        el.static_root = Some(true);
        // Hoisted wholesale; nothing further to decide for this subtree.
        return;
    }
    el.static_root = Some(false);

    let child_is_in_for = is_in_for || el.for_.is_some();
    for child in &mut el.children {
        mark_static_roots(child, child_is_in_for);
    }
    for condition in &mut el.if_conditions {
        mark_static_roots(&mut condition.block, child_is_in_for);
    }
}
