//! Read-only lookups over a parsed tree.

use crate::types::{Node, NodeRef, Tag};

/// The deepest node whose range contains `offset`.
///
/// Unlike [`Span`](crate::Span), node ranges are inclusive at both ends
/// here: an offset equal to a node's `end` still selects it. Children win over
/// their parent and attributes win over their tag. Returns `None` when
/// `offset` lies outside the root.
pub fn node_at_position(tag: &Tag, offset: usize) -> Option<NodeRef<'_>> {
    if offset < tag.start || offset > tag.end {
        return None;
    }

    for child in &tag.children {
        if child.start() > offset {
            break;
        }
        let found = match child {
            Node::Tag(inner) => node_at_position(inner, offset),
            Node::Text(text) | Node::CData(text) => (text.span.start <= offset
                && offset <= text.span.end)
                .then_some(NodeRef::Text(text)),
        };
        if found.is_some() {
            return found;
        }
    }

    if let Some(attr) = tag.attributes.values().find(|attr| attr.hit(offset)) {
        return Some(NodeRef::Attribute(attr));
    }

    Some(NodeRef::Tag(tag))
}

/// State names declared on a document root.
///
/// A `<states>` child in the root's namespace wins; its `<State name="…"/>`
/// children are read in order. Otherwise the comma-separated `states`
/// attribute is used. Names are trimmed.
pub fn declared_states(root: &Tag) -> Vec<String> {
    let from_children: Vec<String> = root
        .tags()
        .find(|t| t.local_name == "states" && t.namespace == root.namespace)
        .map(|states| {
            states
                .tags()
                .filter(|t| t.local_name == "State" && t.namespace == root.namespace)
                .filter_map(|t| t.get_attribute("name"))
                .map(|name| name.trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    if !from_children.is_empty() {
        return from_children;
    }

    root.get_attribute("states")
        .filter(|value| !value.is_empty())
        .map(|value| value.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default()
}

/// The state a document starts in, from the root's `currentState`.
pub fn current_state(root: &Tag) -> Option<&str> {
    root.get_attribute("currentState")
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
