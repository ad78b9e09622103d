//! Property tests for the state editor.

use exml_edit::{
    Scanner, Token, change_state_name, create_new_state, find_path_at_pos, find_range_by_path,
    format_indent, get_value_index, indent_at, is_visible, remove_state,
};
use exml_tree::{Tag, parse};
use proptest::prelude::*;
use std::collections::BTreeMap;

const STATES: &[&str] = &["a", "b"];

#[derive(Debug, Clone)]
struct GenElement {
    name: &'static str,
    membership: Option<(&'static str, String)>,
    state_values: BTreeMap<String, &'static str>,
    label: Option<String>,
    text: Option<String>,
    children: Vec<GenElement>,
}

/// Offset-free view of a parsed tag, for structural comparison.
#[derive(Debug, PartialEq, Eq)]
struct Shape {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Shape>,
}

fn shape(tag: &Tag) -> Shape {
    let mut attributes: Vec<(String, String)> = tag
        .attributes
        .values()
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect();
    attributes.sort();
    Shape {
        name: tag.name.clone(),
        attributes,
        children: tag.tags().map(shape).collect(),
    }
}

fn render(element: &GenElement, out: &mut String, gap: &str) {
    out.push_str(gap);
    out.push_str("<e:");
    out.push_str(element.name);
    if let Some((name, list)) = &element.membership {
        out.push_str(&format!(" {}=\"{}\"", name, list));
    }
    for (stem, state) in &element.state_values {
        out.push_str(&format!(" {}.{}=\"1\"", stem, state));
    }
    if let Some(label) = &element.label {
        out.push_str(&format!(" label=\"{}\"", label));
    }
    if element.children.is_empty() && element.text.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(text) = &element.text {
        out.push_str(text);
    }
    for child in &element.children {
        render(child, out, gap);
    }
    out.push_str(gap);
    out.push_str("</e:");
    out.push_str(element.name);
    out.push('>');
}

fn gen_membership() -> impl Strategy<Value = Option<(&'static str, String)>> {
    prop_oneof![
        Just(None),
        (
            prop::sample::select(vec!["includeIn", "excludeFrom"]),
            prop::sample::subsequence(vec!["a", "b", "x"], 1..=3),
        )
            .prop_map(|(name, states)| Some((name, states.join(",")))),
    ]
}

fn gen_leaf() -> impl Strategy<Value = GenElement> {
    (
        prop::sample::select(vec!["Rect", "Group", "Label", "Image", "Button"]),
        gen_membership(),
        prop::collection::btree_map("[a-z]{1,4}", prop::sample::select(vec!["a", "b", "x"]), 0..2),
        prop::option::of("[中文é ][a-z中文é ]{0,7}"),
        prop::option::of("[a-z中文é]([a-z中文é \n]{0,6}[a-z中文é])?"),
    )
        .prop_map(|(name, membership, state_values, label, text)| GenElement {
            name,
            membership,
            state_values,
            label,
            text,
            children: Vec::new(),
        })
}

fn gen_element() -> impl Strategy<Value = GenElement> {
    gen_leaf().prop_recursive(3, 16, 3, |inner| {
        (gen_leaf(), prop::collection::vec(inner, 1..4)).prop_map(|(mut element, children)| {
            element.text = None;
            element.children = children;
            element
        })
    })
}

fn gen_document() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(gen_element(), 0..4),
        prop::sample::select(vec!["", "\n\t", "\n  "]),
    )
        .prop_map(|(children, gap)| {
            let mut out = String::from(r#"<e:Skin xmlns:e="urn:e" states="a,b">"#);
            for child in &children {
                render(child, &mut out, gap);
            }
            out.push_str(gap);
            out.push_str("</e:Skin>");
            out
        })
}

fn gen_state() -> impl Strategy<Value = Option<&'static str>> {
    prop::sample::select(vec![None, Some("a"), Some("b"), Some("x")])
}

fn visit(tag: &Tag, f: &mut impl FnMut(&Tag)) {
    f(tag);
    for child in tag.tags() {
        visit(child, f);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every element a path can be found for maps back to its own start tag.
    #[test]
    fn test_path_inverse(doc in gen_document(), state in gen_state()) {
        for token in Scanner::new(&doc).filter(Token::is_start) {
            let offset = token.span.start + 1;
            let path = find_path_at_pos(&doc, offset, state, STATES);
            if path.is_empty() {
                continue;
            }
            let range = find_range_by_path(&doc, &path, state, STATES);
            prop_assert_eq!(range.head, Some(token.span));
            prop_assert!(range.tail.is_some());
        }
    }

    /// The root is always reachable.
    #[test]
    fn test_root_path(doc in gen_document(), state in gen_state()) {
        prop_assert_eq!(find_path_at_pos(&doc, 1, state, STATES), vec![0]);
    }

    /// Copying a state and removing the copy restores the document.
    #[test]
    fn test_create_then_remove(doc in gen_document()) {
        let created = create_new_state(&doc, STATES, "c", Some("a"));
        prop_assert!(created.fully_succeeded);
        let removed = remove_state(&created.text, "c", &["a", "b", "c"]);
        prop_assert!(removed.fully_succeeded);
        prop_assert_eq!(shape(&parse(&removed.text).unwrap()), shape(&parse(&doc).unwrap()));
    }

    /// Renaming a state and renaming it back restores the document.
    #[test]
    fn test_rename_roundtrip(doc in gen_document()) {
        let renamed = change_state_name(&doc, "a", "q");
        prop_assert!(renamed.fully_succeeded);
        prop_assert!(!renamed.text.contains("\"a\""));
        let restored = change_state_name(&renamed.text, "q", "a");
        prop_assert_eq!(shape(&parse(&restored.text).unwrap()), shape(&parse(&doc).unwrap()));
    }

    /// Offset-taking operations accept every offset of the document,
    /// including ones inside multibyte characters.
    #[test]
    fn test_offsets_never_panic(doc in gen_document(), state in gen_state()) {
        for offset in 0..=doc.len() {
            let path = find_path_at_pos(&doc, offset, state, STATES);
            prop_assert!(path.is_empty() || path[0] == 0);
            prop_assert!(format_indent(&doc, offset, doc.len()).fully_succeeded);
            prop_assert!(format_indent(&doc, 0, offset).fully_succeeded);
            let _ = indent_at(&doc, offset);
        }
        for token in Scanner::new(&doc).filter(Token::is_start) {
            if let Some(index) = get_value_index(token.text, "label") {
                prop_assert!(token.text.is_char_boundary(index.value_start));
                prop_assert!(token.text.is_char_boundary(index.value_end));
            }
        }
    }

    /// Visibility is defined for every node and state, and unrestricted
    /// nodes are visible everywhere.
    #[test]
    fn test_visibility_total(doc in gen_document(), state in gen_state()) {
        let root = parse(&doc).unwrap();
        let mut failures = Vec::new();
        visit(&root, &mut |tag| {
            let visible = is_visible(tag, state, STATES);
            let restricted = tag.has_attribute("includeIn")
                || tag.has_attribute("excludeFrom")
                || tag.local_name.contains('.');
            if !restricted && !visible {
                failures.push(tag.name.clone());
            }
        });
        prop_assert!(failures.is_empty(), "hidden without restriction: {:?}", failures);
    }
}
