//! Which view states a node takes part in.
//!
//! A node belongs to every state unless it says otherwise: a dotted suffix on
//! its local name (`Rect.down`) pins it to one state, `includeIn` lists the
//! states it appears in, and `excludeFrom` lists the states it is missing
//! from. The skin root is always present.

use crate::config::Dialect;
use crate::editor::StateEditor;
use crate::scanner::{Token, TokenKind};
use crate::value_index::split_list;
use exml_tree::{ParseOptions, Tag, parse_with_options};

/// The facts visibility depends on, however the node was read.
struct Membership<'a> {
    local_name: &'a str,
    include_in: Option<&'a str>,
    exclude_from: Option<&'a str>,
}

impl<'a> Membership<'a> {
    fn of(tag: &'a Tag) -> Self {
        Self {
            local_name: &tag.local_name,
            include_in: tag.get_attribute("includeIn"),
            exclude_from: tag.get_attribute("excludeFrom"),
        }
    }

    fn visible(&self, dialect: &Dialect, current_state: &str) -> bool {
        if self.local_name == dialect.skin {
            return true;
        }
        if let Some((_, suffix)) = self.local_name.split_once('.') {
            return suffix == current_state;
        }
        if let Some(include_in) = self.include_in {
            return split_list(include_in).contains(&current_state);
        }
        if let Some(exclude_from) = self.exclude_from {
            return !split_list(exclude_from).contains(&current_state);
        }
        true
    }

    /// States the node takes part in, if it restricts itself at all.
    fn states<'s>(&self, all_states: &[&'s str]) -> Vec<&'s str>
    where
        'a: 's,
    {
        if let Some(include_in) = self.include_in {
            return split_list(include_in);
        }
        if let Some(exclude_from) = self.exclude_from {
            let excluded = split_list(exclude_from);
            return all_states
                .iter()
                .copied()
                .filter(|s| !excluded.contains(s))
                .collect();
        }
        Vec::new()
    }
}

/// Normalize an unset or empty current state to `None`.
pub(crate) fn active(current_state: Option<&str>) -> Option<&str> {
    current_state.filter(|s| !s.is_empty())
}

impl StateEditor {
    /// Whether `tag` is present in `current_state`. Everything is visible
    /// when no state is current.
    pub fn is_visible(&self, tag: &Tag, current_state: Option<&str>, _all_states: &[&str]) -> bool {
        match active(current_state) {
            None => true,
            Some(state) => Membership::of(tag).visible(&self.dialect, state),
        }
    }

    /// Whether `tag` takes part in exactly one of `all_states`, through
    /// `includeIn` or `excludeFrom`. The skin root never does.
    pub fn is_single_state(&self, tag: &Tag, all_states: &[&str]) -> bool {
        if tag.local_name == self.dialect.skin {
            return false;
        }
        Membership::of(tag).states(all_states).len() == 1
    }

    /// Visibility of a raw element token.
    ///
    /// Close tags and working-prefix elements are always visible. Otherwise
    /// the token is parsed on its own (an open tag is closed first) and
    /// judged like a tree node; a token that does not parse counts as
    /// visible.
    pub(crate) fn token_visible(&self, token: &Token<'_>, current_state: Option<&str>) -> bool {
        let Some(state) = active(current_state) else {
            return true;
        };
        if !token.is_start() {
            return true;
        }
        let text = token.text;
        if !text.contains("includeIn") && !text.contains("excludeFrom") && !text.contains('.') {
            return true;
        }
        if token.prefix() == Some(self.dialect.working_prefix.as_str()) {
            return true;
        }

        let mut fragment = match token.prefix() {
            Some(prefix) => format!("<{}", &text[prefix.len() + 2..]),
            None => text.to_string(),
        };
        if token.kind == TokenKind::Open {
            fragment.pop();
            fragment.push_str("/>");
        }

        let options = ParseOptions::default().with_cache(false).with_position_in_errors(false);
        match parse_with_options(&fragment, &options) {
            Ok(tag) => Membership::of(&tag).visible(&self.dialect, state),
            Err(_) => true,
        }
    }
}
