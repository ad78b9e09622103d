//! Structural mutation of a parsed tree.

use crate::parser::parse;
use crate::stringify::stringify;
use crate::types::{Namespace, Node, Tag};
use crate::{Error, Result};

/// Append a copy of `child` to the tag at `parent_location` inside `root`.
///
/// The copy is made by serializing and re-parsing `child`, so it shares
/// nothing with the original. `xmlns:*` declarations that the root-to-parent
/// chain already makes are dropped from the copy, and the copy's prefixes are
/// resolved against the host scope. Offsets inside the copy refer to its own
/// serialized text, not to the host document.
///
/// # Errors
///
/// [`Error::MissingNode`] if no tag exists at `parent_location`, or the parse
/// error if `child` does not serialize to a well-formed fragment.
pub fn append_child(root: &mut Tag, parent_location: &[usize], child: &Tag) -> Result<()> {
    let mut copy = parse(&stringify(child))?;

    let mut scope = Vec::new();
    for depth in 0..=parent_location.len() {
        let ancestor = root
            .descendant(&parent_location[..depth])
            .ok_or_else(|| Error::MissingNode {
                location: parent_location.to_vec(),
            })?;
        scope.extend(ancestor.namespace_declarations());
    }

    let redundant: Vec<String> = copy
        .attributes
        .keys()
        .filter(|name| {
            name.strip_prefix("xmlns:")
                .is_some_and(|prefix| scope.iter().any(|ns| ns.prefix == prefix))
        })
        .cloned()
        .collect();
    for name in &redundant {
        copy.delete_attribute(name);
    }

    resolve_namespaces(&mut copy, &mut scope);

    let parent = root
        .descendant_mut(parent_location)
        .ok_or_else(|| Error::MissingNode {
            location: parent_location.to_vec(),
        })?;
    let mut location = parent_location.to_vec();
    location.push(parent.children.len());
    copy.relink(location);
    parent.children.push(Node::Tag(copy));
    Ok(())
}

/// Re-resolve `namespace` for `tag` and its subtree, innermost binding first.
fn resolve_namespaces(tag: &mut Tag, scope: &mut Vec<Namespace>) {
    let declared = tag.namespace_declarations();
    let depth = scope.len();
    scope.extend(declared);

    if let Some(prefix) = tag.prefix.as_deref() {
        tag.namespace = scope
            .iter()
            .rev()
            .find(|ns| ns.prefix == prefix)
            .map(|ns| ns.uri.clone())
            .unwrap_or_default();
    }
    for child in &mut tag.children {
        if let Node::Tag(inner) = child {
            resolve_namespaces(inner, scope);
        }
    }

    scope.truncate(depth);
}
