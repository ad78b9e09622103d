//! The state editor and the crate-level functions that use its defaults.

use crate::config::{Dialect, IndentStyle};
use crate::edit::EditResult;
use crate::namespace::NamespaceEdit;
use crate::path::NodeRange;
use exml_tree::{Namespace, Tag};
use once_cell::sync::Lazy;

/// Text-level view-state editing for one EXML dialect.
///
/// Every operation is a pure function of its inputs; the editor only holds
/// configuration and can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct StateEditor {
    pub(crate) dialect: Dialect,
    pub(crate) indent: IndentStyle,
}

impl StateEditor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            indent: IndentStyle::default(),
        }
    }

    pub fn with_indent_style(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn indent_style(&self) -> &IndentStyle {
        &self.indent
    }
}

static DEFAULT_EDITOR: Lazy<StateEditor> = Lazy::new(StateEditor::default);

/// See [`StateEditor::is_visible`].
pub fn is_visible(tag: &Tag, current_state: Option<&str>, all_states: &[&str]) -> bool {
    DEFAULT_EDITOR.is_visible(tag, current_state, all_states)
}

/// See [`StateEditor::is_single_state`].
pub fn is_single_state(tag: &Tag, all_states: &[&str]) -> bool {
    DEFAULT_EDITOR.is_single_state(tag, all_states)
}

/// See [`StateEditor::find_range_by_path`].
pub fn find_range_by_path(
    text: &str,
    path: &[usize],
    current_state: Option<&str>,
    all_states: &[&str],
) -> NodeRange {
    DEFAULT_EDITOR.find_range_by_path(text, path, current_state, all_states)
}

/// See [`StateEditor::find_path_at_pos`].
pub fn find_path_at_pos(
    text: &str,
    offset: usize,
    current_state: Option<&str>,
    all_states: &[&str],
) -> Vec<usize> {
    DEFAULT_EDITOR.find_path_at_pos(text, offset, current_state, all_states)
}

/// See [`StateEditor::find_item_by_path`].
pub fn find_item_by_path<'a>(
    root: &'a Tag,
    path: &[usize],
    current_state: Option<&str>,
    all_states: &[&str],
) -> Option<&'a Tag> {
    DEFAULT_EDITOR.find_item_by_path(root, path, current_state, all_states)
}

/// See [`StateEditor::add_namespace`].
pub fn add_namespace(text: &str, namespace: &Namespace) -> NamespaceEdit {
    DEFAULT_EDITOR.add_namespace(text, namespace)
}

/// See [`StateEditor::clean_namespace`].
pub fn clean_namespace(text: &str) -> EditResult {
    DEFAULT_EDITOR.clean_namespace(text)
}

/// See [`StateEditor::create_new_state`].
pub fn create_new_state(
    text: &str,
    all_states: &[&str],
    new_state: &str,
    copy_from: Option<&str>,
) -> EditResult {
    DEFAULT_EDITOR.create_new_state(text, all_states, new_state, copy_from)
}

/// See [`StateEditor::remove_state`].
pub fn remove_state(text: &str, state: &str, all_states: &[&str]) -> EditResult {
    DEFAULT_EDITOR.remove_state(text, state, all_states)
}

/// See [`StateEditor::change_state_name`].
pub fn change_state_name(text: &str, old_name: &str, new_name: &str) -> EditResult {
    DEFAULT_EDITOR.change_state_name(text, old_name, new_name)
}

/// See [`StateEditor::set_start_state`].
pub fn set_start_state(text: &str, state: Option<&str>) -> EditResult {
    DEFAULT_EDITOR.set_start_state(text, state)
}

/// See [`StateEditor::format_indent`].
pub fn format_indent(text: &str, start: usize, end: usize) -> EditResult {
    DEFAULT_EDITOR.format_indent(text, start, end)
}

/// See [`StateEditor::indent_at`].
pub fn indent_at(text: &str, index: usize) -> usize {
    DEFAULT_EDITOR.indent_at(text, index)
}

/// See [`StateEditor::indent_string_at`].
pub fn indent_string_at(text: &str, index: usize) -> String {
    DEFAULT_EDITOR.indent_string_at(text, index)
}
