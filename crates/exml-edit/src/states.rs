//! View-state edits on raw EXML text.
//!
//! Each transform walks the document once with the shared [`Scanner`],
//! rewrites the start tags it has to touch and copies everything else
//! through unchanged, comments and formatting included. `Declarations`
//! blocks are never edited. The root tag's `states` attribute is kept in
//! step with every create, remove and rename.

use crate::edit::{EditResult, Rewriter};
use crate::editor::StateEditor;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value_index::{
    get_value_index, insert_attribute, insert_raw, remove_attribute, replace_value, split_list,
};
use crate::visibility::active;
use exml_tree::{Span, tag_attributes};
use std::collections::HashSet;

/// Stem of a state-specific attribute name (`width.down` → `width`).
fn state_attribute_stem<'a>(name: &'a str, state: &str) -> Option<&'a str> {
    let stem = name.strip_suffix(state)?.strip_suffix('.')?;
    (!stem.is_empty()).then_some(stem)
}

/// Add `state` to the list in attribute `name`. With `only_with` set, lists
/// that do not already contain that state are left alone.
fn extend_list(tag_text: &str, name: &str, state: &str, only_with: Option<&str>) -> Option<String> {
    let index = get_value_index(tag_text, name)?;
    let mut list = split_list(index.value(tag_text));
    if list.contains(&state) || only_with.is_some_and(|base| !list.contains(&base)) {
        return None;
    }
    list.push(state);
    Some(replace_value(tag_text, &index, &list.join(",")))
}

/// Replace `old` with `new` in the list in attribute `name`.
fn rename_in_list(tag_text: &str, name: &str, old: &str, new: &str) -> Option<String> {
    let index = get_value_index(tag_text, name)?;
    let list = split_list(index.value(tag_text));
    if !list.contains(&old) {
        return None;
    }
    let renamed: Vec<&str> = list.into_iter().map(|s| if s == old { new } else { s }).collect();
    Some(replace_value(tag_text, &index, &renamed.join(",")))
}

/// Copy every `x.base` attribute to `x.state` unless the tag already has one.
fn duplicate_state_attributes(tag_text: &str, kind: TokenKind, base: &str, state: &str) -> Option<String> {
    let attributes = tag_attributes(tag_text);
    let existing: HashSet<&str> = attributes.iter().map(|a| a.name(tag_text)).collect();
    let mut added = String::new();
    for attr in &attributes {
        let Some(stem) = state_attribute_stem(attr.name(tag_text), base) else {
            continue;
        };
        let name = format!("{}.{}", stem, state);
        if existing.contains(name.as_str()) {
            continue;
        }
        let quote = if attr.quote == 0 { '"' } else { attr.quote as char };
        added.push_str(&format!(" {}={}{}{}", name, quote, attr.value(tag_text), quote));
    }
    (!added.is_empty()).then(|| insert_raw(tag_text, kind, &added))
}

/// Drop every `x.state` attribute.
fn strip_state_attributes(tag_text: &str, state: &str) -> String {
    let mut out = String::with_capacity(tag_text.len());
    let mut cursor = 0;
    for attr in tag_attributes(tag_text) {
        if state_attribute_stem(attr.name(tag_text), state).is_some() {
            out.push_str(&tag_text[cursor..attr.extent.start]);
            cursor = attr.extent.end;
        }
    }
    out.push_str(&tag_text[cursor..]);
    out
}

/// Rename every `x.old` attribute to `x.new`, keeping its value.
fn rename_state_attributes(tag_text: &str, old: &str, new: &str) -> String {
    let mut out = String::with_capacity(tag_text.len());
    let mut cursor = 0;
    for attr in tag_attributes(tag_text) {
        if let Some(stem) = state_attribute_stem(attr.name(tag_text), old) {
            out.push_str(&tag_text[cursor..attr.name.start]);
            out.push_str(stem);
            out.push('.');
            out.push_str(new);
            cursor = attr.name.end;
        }
    }
    out.push_str(&tag_text[cursor..]);
    out
}

/// Apply `edit` to the root start tag. `None` if the document has no root
/// start tag or `edit` declines.
fn edit_root(text: &str, edit: impl FnOnce(&Token<'_>) -> Option<String>) -> Option<String> {
    let root = Scanner::new(text).find(Token::is_element)?;
    if !root.is_start() {
        return None;
    }
    let tag = edit(&root)?;
    Some(format!("{}{}{}", &text[..root.span.start], tag, &text[root.span.end..]))
}

/// Remove the element opened by `open`, its subtree and the blank run before
/// it. An element that never closes is left in place.
fn delete_element(scanner: &mut Scanner<'_>, rewriter: &mut Rewriter<'_>, open: &Token<'_>) {
    if let Some(end) = scanner.skip_subtree(open) {
        tracing::debug!(element = open.name(), offset = open.span.start, "removing element");
        rewriter.remove(Span::new(open.span.start, end));
    }
}

impl StateEditor {
    /// Add view state `new_state` to the document.
    ///
    /// Without `copy_from` the new state starts blank: every component
    /// directly under the root is scoped out of it, by appending `new_state`
    /// to an existing `excludeFrom` or by restricting the component to
    /// `all_states` with a new `includeIn`. Components that already have an
    /// `includeIn` are out of it anyway. The children of an `Array` or
    /// `elementsContent` container at that level are treated as direct
    /// children too.
    ///
    /// With `copy_from` set to a state, the new state copies it: every
    /// `includeIn` or `excludeFrom` list naming `copy_from` gets `new_state`
    /// as well, and every `x.copy_from` attribute is duplicated as
    /// `x.new_state`. An empty `copy_from` copies the base state, which only
    /// `excludeFrom` lists affect.
    ///
    /// Either way `new_state` is appended to the root's `states` attribute.
    pub fn create_new_state(
        &self,
        text: &str,
        all_states: &[&str],
        new_state: &str,
        copy_from: Option<&str>,
    ) -> EditResult {
        let result = match copy_from {
            None => self.create_blank_state(text, all_states, new_state),
            Some(base) => self.copy_state(text, new_state, base),
        };
        result.and_then(|text| self.add_state_to_define(text, new_state))
    }

    fn is_component(&self, token: &Token<'_>) -> bool {
        token.prefix() != Some(self.dialect.working_prefix.as_str())
            && token.local_name().starts_with(|c: char| c.is_ascii_uppercase())
    }

    fn create_blank_state(&self, text: &str, all_states: &[&str], new_state: &str) -> EditResult {
        let mut scanner = Scanner::new(text);
        let mut rewriter = Rewriter::new(text);
        // Per open element: whether its direct children get scoped.
        let mut scoped: Vec<bool> = Vec::new();

        while let Some(token) = scanner.next() {
            match token.kind {
                TokenKind::Close => {
                    scoped.pop();
                    continue;
                }
                TokenKind::Open | TokenKind::SelfClosing => {}
                _ => continue,
            }
            if token.local_name() == self.dialect.declarations {
                scanner.skip_subtree(&token);
                continue;
            }
            let Some(&level_scoped) = scoped.last() else {
                if token.kind == TokenKind::Open {
                    scoped.push(true);
                }
                continue;
            };

            let container = level_scoped && self.dialect.is_container(token.local_name());
            if level_scoped && !container && self.is_component(&token) {
                if let Some(tag) = scope_out(token.text, token.kind, all_states, new_state) {
                    rewriter.replace(token.span, &tag);
                }
            }
            if token.kind == TokenKind::Open {
                scoped.push(container);
            }
        }

        rewriter.finish(scanner.is_clean())
    }

    fn copy_state(&self, text: &str, new_state: &str, base: &str) -> EditResult {
        let mut scanner = Scanner::new(text);
        let mut rewriter = Rewriter::new(text);

        while let Some(token) = scanner.next() {
            if !token.is_start() {
                continue;
            }
            if token.local_name() == self.dialect.declarations {
                scanner.skip_subtree(&token);
                continue;
            }

            let mut tag = token.text.to_string();
            if base.is_empty() {
                if let Some(edited) = extend_list(&tag, "excludeFrom", new_state, None) {
                    tag = edited;
                }
            } else {
                for name in ["excludeFrom", "includeIn"] {
                    if let Some(edited) = extend_list(&tag, name, new_state, Some(base)) {
                        tag = edited;
                    }
                }
                if let Some(edited) = duplicate_state_attributes(&tag, token.kind, base, new_state) {
                    tag = edited;
                }
            }
            if tag != token.text {
                rewriter.replace(token.span, &tag);
            }
        }

        rewriter.finish(scanner.is_clean())
    }

    /// Remove view state `state` from the document.
    ///
    /// `state` is dropped from every `includeIn` and `excludeFrom` list. An
    /// emptied `excludeFrom` is removed; an emptied `includeIn` takes its
    /// element with it, as does an `excludeFrom` that leaves `state` as the
    /// element's only state. The matching `<State name="…">` declaration and
    /// every `x.state` attribute are removed. When `state` is the only one
    /// in `all_states`, the `<states>` block goes too.
    pub fn remove_state(&self, text: &str, state: &str, all_states: &[&str]) -> EditResult {
        let mut scanner = Scanner::new(text);
        let mut rewriter = Rewriter::new(text);
        let mut declaration_removed = false;

        while let Some(token) = scanner.next() {
            if !token.is_start() {
                continue;
            }
            let local_name = token.local_name();
            if local_name == self.dialect.declarations {
                scanner.skip_subtree(&token);
                continue;
            }
            if local_name == self.dialect.states && all_states.len() <= 1 {
                delete_element(&mut scanner, &mut rewriter, &token);
                continue;
            }
            if !declaration_removed
                && local_name == self.dialect.state
                && get_value_index(token.text, "name").is_some_and(|i| i.value(token.text).trim() == state)
            {
                declaration_removed = true;
                delete_element(&mut scanner, &mut rewriter, &token);
                continue;
            }

            let mut tag = token.text.to_string();
            if let Some(index) = get_value_index(&tag, "excludeFrom") {
                let mut list = split_list(index.value(&tag));
                if let Some(position) = list.iter().position(|s| *s == state) {
                    list.remove(position);
                    let edited = if list.is_empty() {
                        remove_attribute(&tag, &index)
                    } else {
                        replace_value(&tag, &index, &list.join(","))
                    };
                    tag = edited;
                } else {
                    let remaining: Vec<&str> = all_states
                        .iter()
                        .copied()
                        .filter(|s| !list.contains(s))
                        .collect();
                    if remaining == [state] {
                        delete_element(&mut scanner, &mut rewriter, &token);
                        continue;
                    }
                }
            }
            if let Some(index) = get_value_index(&tag, "includeIn") {
                let mut list = split_list(index.value(&tag));
                if let Some(position) = list.iter().position(|s| *s == state) {
                    list.remove(position);
                    if list.is_empty() {
                        delete_element(&mut scanner, &mut rewriter, &token);
                        continue;
                    }
                    let edited = replace_value(&tag, &index, &list.join(","));
                    tag = edited;
                }
            }
            let tag = strip_state_attributes(&tag, state);
            if tag != token.text {
                rewriter.replace(token.span, &tag);
            }
        }

        rewriter
            .finish(scanner.is_clean())
            .and_then(|text| self.remove_state_from_define(text, state))
    }

    /// Rename view state `old_name` to `new_name` in the first matching
    /// `<State name="…">` declaration, the root's `currentState`, every
    /// `includeIn` and `excludeFrom` list, every `x.old_name` attribute and
    /// the root's `states` attribute.
    pub fn change_state_name(&self, text: &str, old_name: &str, new_name: &str) -> EditResult {
        let mut scanner = Scanner::new(text);
        let mut rewriter = Rewriter::new(text);
        let mut declaration_renamed = false;

        while let Some(token) = scanner.next() {
            if !token.is_start() {
                continue;
            }
            if token.local_name() == self.dialect.declarations {
                scanner.skip_subtree(&token);
                continue;
            }
            if !declaration_renamed && token.local_name() == self.dialect.state {
                if let Some(index) = get_value_index(token.text, "name") {
                    if index.value(token.text).trim() == old_name {
                        declaration_renamed = true;
                        rewriter.replace(token.span, &replace_value(token.text, &index, new_name));
                        continue;
                    }
                }
            }

            let mut tag = token.text.to_string();
            if let Some(index) = get_value_index(&tag, "currentState") {
                if index.value(&tag).trim() == old_name {
                    let edited = replace_value(&tag, &index, new_name);
                    tag = edited;
                }
            }
            for name in ["includeIn", "excludeFrom"] {
                if let Some(edited) = rename_in_list(&tag, name, old_name, new_name) {
                    tag = edited;
                }
            }
            let tag = rename_state_attributes(&tag, old_name, new_name);
            if tag != token.text {
                rewriter.replace(token.span, &tag);
            }
        }

        rewriter
            .finish(scanner.is_clean())
            .and_then(|text| self.rename_state_in_define(text, old_name, new_name))
    }

    /// Set the root's `currentState` attribute, or remove it with `None`.
    ///
    /// A new attribute is written in front of the root's first `xmlns:`
    /// declaration, or after its last attribute if it has none.
    pub fn set_start_state(&self, text: &str, state: Option<&str>) -> EditResult {
        let state = active(state);
        let edited = edit_root(text, |root| {
            let existing = get_value_index(root.text, "currentState");
            Some(match (existing, state) {
                (Some(index), Some(state)) => replace_value(root.text, &index, state),
                (Some(index), None) => remove_attribute(root.text, &index),
                (None, Some(state)) => match tag_attributes(root.text)
                    .into_iter()
                    .find(|attr| attr.name(root.text).starts_with("xmlns:"))
                {
                    Some(attr) => format!(
                        "{}currentState=\"{}\" {}",
                        &root.text[..attr.name.start],
                        state,
                        &root.text[attr.name.start..]
                    ),
                    None => insert_attribute(root.text, root.kind, "currentState", state),
                },
                (None, None) => root.text.to_string(),
            })
        });
        match edited {
            Some(edited) => EditResult::new(edited, true),
            None => EditResult::unchanged(text, false),
        }
    }

    fn add_state_to_define(&self, text: &str, state: &str) -> EditResult {
        let edited = edit_root(text, |root| {
            Some(match get_value_index(root.text, "states") {
                Some(index) => {
                    let mut list = split_list(index.value(root.text));
                    if list.contains(&state) {
                        return Some(root.text.to_string());
                    }
                    list.push(state);
                    replace_value(root.text, &index, &list.join(","))
                }
                None => insert_attribute(root.text, root.kind, "states", state),
            })
        });
        match edited {
            Some(edited) => EditResult::new(edited, true),
            None => EditResult::unchanged(text, false),
        }
    }

    fn remove_state_from_define(&self, text: &str, state: &str) -> EditResult {
        let edited = edit_root(text, |root| {
            let index = get_value_index(root.text, "states")?;
            let mut list = split_list(index.value(root.text));
            let position = list.iter().position(|s| *s == state)?;
            list.remove(position);
            Some(if list.is_empty() {
                remove_attribute(root.text, &index)
            } else {
                replace_value(root.text, &index, &list.join(","))
            })
        });
        EditResult::new(edited.unwrap_or_else(|| text.to_string()), true)
    }

    fn rename_state_in_define(&self, text: &str, old_name: &str, new_name: &str) -> EditResult {
        let edited = edit_root(text, |root| rename_in_list(root.text, "states", old_name, new_name));
        EditResult::new(edited.unwrap_or_else(|| text.to_string()), true)
    }
}

/// Keep a component out of `new_state`. `None` if it already is.
fn scope_out(tag_text: &str, kind: TokenKind, all_states: &[&str], new_state: &str) -> Option<String> {
    if get_value_index(tag_text, "includeIn").is_some() {
        return None;
    }
    if get_value_index(tag_text, "excludeFrom").is_some() {
        return extend_list(tag_text, "excludeFrom", new_state, None);
    }
    if all_states.is_empty() {
        return None;
    }
    Some(insert_attribute(tag_text, kind, "includeIn", &all_states.join(",")))
}
