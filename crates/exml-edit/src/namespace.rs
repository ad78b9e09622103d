//! Namespace declarations on the root tag, edited as text.

use crate::edit::{EditResult, Rewriter};
use crate::editor::StateEditor;
use crate::scanner::{Scanner, Token};
use exml_tree::{AttributeSpan, Namespace, Span, tag_attributes};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static XMLNS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^xmlns(?::(.+))?$").unwrap());

static HEAD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*<\?(?s:.*?)\?>").unwrap());

/// Text inserted by [`StateEditor::add_namespace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Byte offset in the original text.
    pub offset: usize,
    pub content: String,
}

/// Result of [`StateEditor::add_namespace`]: the edited text and, when a
/// declaration was written, where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEdit {
    pub result: EditResult,
    pub added: Option<Insertion>,
}

impl NamespaceEdit {
    fn unchanged(text: &str, fully_succeeded: bool) -> Self {
        Self {
            result: EditResult::unchanged(text, fully_succeeded),
            added: None,
        }
    }
}

fn root_token(text: &str) -> Option<Token<'_>> {
    Scanner::new(text).find(Token::is_start)
}

/// Namespace declarations in a tag's text, with their attribute spans.
fn declarations(tag_text: &str) -> Vec<(Namespace, AttributeSpan)> {
    tag_attributes(tag_text)
        .into_iter()
        .filter_map(|attr| {
            let caps = XMLNS_RE.captures(attr.name(tag_text))?;
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            Some((Namespace::new(prefix, attr.value(tag_text).trim()), attr))
        })
        .collect()
}

/// Namespaces declared on the root tag, in source order. The default
/// namespace has an empty prefix.
pub fn get_namespaces(text: &str) -> Vec<Namespace> {
    root_token(text)
        .map(|root| {
            declarations(root.text)
                .into_iter()
                .map(|(namespace, _)| namespace)
                .collect()
        })
        .unwrap_or_default()
}

/// `text` without a leading `<?…?>` declaration. Everything up to the next
/// `<` after the declaration is dropped too.
pub fn remove_head(text: &str) -> &str {
    let Some(head) = HEAD_RE.find(text) else {
        return text;
    };
    let rest = &text[head.end()..];
    rest.find('<').map_or(rest, |i| &rest[i..])
}

impl StateEditor {
    /// Declare `namespace` on the root tag.
    ///
    /// The declaration goes after the root's last existing namespace
    /// declaration, or after its last attribute if it has none. Nothing is
    /// written if the same pair is already declared. A prefix already bound
    /// to a different URI is left alone and reported as a failure, as is a
    /// document without a root tag.
    pub fn add_namespace(&self, text: &str, namespace: &Namespace) -> NamespaceEdit {
        let Some(root) = root_token(text) else {
            return NamespaceEdit::unchanged(text, false);
        };
        let declared = declarations(root.text);
        if declared.iter().any(|(existing, _)| existing == namespace) {
            return NamespaceEdit::unchanged(text, true);
        }
        if declared.iter().any(|(existing, _)| existing.prefix == namespace.prefix) {
            tracing::debug!(prefix = %namespace.prefix, "namespace prefix already bound");
            return NamespaceEdit::unchanged(text, false);
        }

        let offset = root.span.start
            + declared
                .last()
                .map_or_else(|| root.insertion_point(), |(_, attr)| attr.extent.end);
        let content = if namespace.prefix.is_empty() {
            format!(" xmlns=\"{}\"", namespace.uri)
        } else {
            format!(" xmlns:{}=\"{}\"", namespace.prefix, namespace.uri)
        };
        let edited = format!("{}{}{}", &text[..offset], content, &text[offset..]);
        NamespaceEdit {
            result: EditResult::new(edited, true),
            added: Some(Insertion { offset, content }),
        }
    }

    /// Drop every `xmlns:p` declaration whose prefix no element name uses.
    pub fn clean_namespace(&self, text: &str) -> EditResult {
        let mut scanner = Scanner::new(text);
        let mut used = HashSet::new();
        let mut starts = Vec::new();
        for token in scanner.by_ref().filter(Token::is_element) {
            if let Some(prefix) = token.prefix() {
                used.insert(prefix);
            }
            if token.is_start() {
                starts.push(token);
            }
        }

        let mut rewriter = Rewriter::new(text);
        for token in &starts {
            for (namespace, attr) in declarations(token.text) {
                if namespace.prefix.is_empty() || used.contains(namespace.prefix.as_str()) {
                    continue;
                }
                let extent = Span::new(
                    token.span.start + attr.extent.start,
                    token.span.start + attr.extent.end,
                );
                rewriter.replace(extent, "");
            }
        }
        rewriter.finish(scanner.is_clean())
    }
}
