//! Tree to text serialization.
//!
//! Output is tab-indented, one element per line, with every attribute value
//! double-quoted. Text content is written inline when an element has no child
//! elements, and on its own line before them otherwise.

use crate::types::{Node, Tag};
use quick_xml::escape::escape;
use std::fmt::Write;

/// Serialize `tag` and its subtree.
pub fn stringify(tag: &Tag) -> String {
    let mut out = String::new();
    write_tag(&mut out, tag, 0, &[]);
    out
}

/// Serialize `tag`, a node inside the tree rooted at `root`, so that the
/// result parses on its own.
///
/// Every `xmlns:*` declaration of the root that `tag` does not redeclare is
/// appended to its attributes. For the root itself this is [`stringify`].
pub fn stringify_fragment(root: &Tag, tag: &Tag) -> String {
    if tag.is_root() {
        return stringify(tag);
    }
    let forwarded: Vec<(&str, &str)> = root
        .attributes
        .values()
        .filter(|attr| attr.name.starts_with("xmlns:") && !tag.has_attribute(&attr.name))
        .map(|attr| (attr.name.as_str(), attr.value.as_str()))
        .collect();

    let mut out = String::new();
    write_tag(&mut out, tag, 0, &forwarded);
    out
}

fn write_tag(out: &mut String, tag: &Tag, depth: usize, extra: &[(&str, &str)]) {
    push_indent(out, depth);
    out.push('<');
    out.push_str(&tag.name);

    let attributes = tag
        .attributes
        .values()
        .map(|attr| (attr.name.as_str(), attr.value.as_str()));
    for (name, value) in attributes.chain(extra.iter().copied()) {
        let _ = write!(out, " {}=\"{}\"", name, escape(value));
    }

    let has_tags = tag.tags().next().is_some();
    let text = tag.text.as_deref().filter(|t| !t.is_empty());

    match (text, has_tags) {
        (None, false) => out.push_str(" />"),
        (Some(_), false) => {
            out.push('>');
            write_text(out, tag);
            let _ = write!(out, "</{}>", tag.name);
        }
        (text, true) => {
            out.push_str(">\n");
            if text.is_some() {
                push_indent(out, depth + 1);
                write_text(out, tag);
                out.push('\n');
            }
            for child in tag.tags() {
                write_tag(out, child, depth + 1, &[]);
                out.push('\n');
            }
            push_indent(out, depth);
            let _ = write!(out, "</{}>", tag.name);
        }
    }
}

/// Write the tag's text, keeping CDATA sections as CDATA.
fn write_text(out: &mut String, tag: &Tag) {
    let Some(text) = tag.text.as_deref() else {
        return;
    };
    let is_cdata = tag
        .children
        .iter()
        .any(|child| matches!(child, Node::CData(cdata) if cdata.content == text));
    if is_cdata {
        let _ = write!(out, "<![CDATA[{}]]>", text);
    } else {
        out.push_str(&escape(text));
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}
