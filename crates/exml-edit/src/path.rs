//! Mapping between structural paths and byte ranges.
//!
//! A path is a list of child indices, one per depth, starting with the root
//! (always `0`). Only children visible in the current state are counted, so
//! the same node can have different paths in different states.

use crate::editor::StateEditor;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::visibility::active;
use exml_tree::{Node, Span, Tag};
use std::collections::VecDeque;

/// Where a node's tags sit in the text.
///
/// `head` is the start tag. `tail` is the end tag, or the empty span at
/// `head.end` for a self-closing element. Either is `None` if not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeRange {
    pub head: Option<Span>,
    pub tail: Option<Span>,
}

impl NodeRange {
    /// The whole element, from its `<` to the end of its end tag.
    pub fn span(&self) -> Option<Span> {
        match (self.head, self.tail) {
            (Some(head), Some(tail)) => Some(Span::new(head.start, tail.end)),
            _ => None,
        }
    }
}

impl StateEditor {
    /// Locate the node at `path` in `text`.
    ///
    /// Works token by token, so the text does not have to parse. Tokens
    /// hidden in `current_state` do not count toward sibling indices.
    pub fn find_range_by_path(
        &self,
        text: &str,
        path: &[usize],
        current_state: Option<&str>,
        _all_states: &[&str],
    ) -> NodeRange {
        let current_state = active(current_state);
        // Remaining indices; the front one counts down as siblings pass and
        // reaches -1 on the wanted self-closing sibling.
        let mut remaining: VecDeque<i64> = path.iter().map(|&i| i as i64).collect();
        let mut open_num: i64 = 0;
        let mut range = NodeRange::default();

        for token in Scanner::new(text) {
            if !token.is_element() {
                continue;
            }
            if !remaining.is_empty()
                && open_num == 0
                && !self.token_visible(&token, current_state)
            {
                remaining[0] += 1;
            }

            match token.kind {
                TokenKind::SelfClosing => {
                    if !remaining.is_empty() && open_num == 0 {
                        remaining[0] -= 1;
                        if remaining[0] == -1 {
                            remaining.pop_front();
                            if !remaining.is_empty() {
                                // The path continues below a leaf.
                                return NodeRange::default();
                            }
                        }
                    }
                }
                TokenKind::Open => {
                    open_num += 1;
                    if remaining.front() == Some(&0) {
                        remaining.pop_front();
                        open_num = 0;
                    }
                }
                TokenKind::Close => {
                    open_num -= 1;
                    if !remaining.is_empty() && open_num == 0 {
                        remaining[0] -= 1;
                    }
                }
                _ => {}
            }

            if remaining.is_empty() {
                match range.head {
                    None => {
                        range.head = Some(token.span);
                        if token.kind == TokenKind::SelfClosing {
                            range.tail = Some(Span::new(token.span.end, token.span.end));
                            break;
                        }
                    }
                    Some(_) if open_num == -1 => {
                        range.tail = Some(token.span);
                        break;
                    }
                    Some(_) => {}
                }
            }
        }

        range
    }

    /// The path of the node at `offset`, or an empty path if there is none.
    ///
    /// An offset inside a tag selects that tag's element. An offset between
    /// tags selects the element before it if no line break precedes the
    /// offset in that gap, and the element after it otherwise. The text must
    /// parse, and the selected element and all of its ancestors must be
    /// visible in `current_state`.
    pub fn find_path_at_pos(
        &self,
        text: &str,
        offset: usize,
        current_state: Option<&str>,
        _all_states: &[&str],
    ) -> Vec<usize> {
        if offset > text.len() || exml_tree::parse(text).is_err() {
            return Vec::new();
        }
        let current_state = active(current_state);

        let mut tokens: Vec<Token<'_>> = Vec::new();
        for token in Scanner::new(text).filter(Token::is_element) {
            if offset < token.span.start {
                let gap_start = tokens.last().map_or(0, |t: &Token<'_>| t.span.end);
                let gap = &text.as_bytes()[gap_start..offset];
                if tokens.is_empty() || gap.iter().any(|b| matches!(b, b'\n' | b'\r')) {
                    tokens.push(token);
                }
                break;
            }
            tokens.push(token);
            if offset < token.span.end {
                break;
            }
        }

        let Some(selected) = tokens.last().copied() else {
            return Vec::new();
        };
        let selected_open = if selected.kind == TokenKind::Close {
            matching_open(&tokens)
        } else {
            Some(selected)
        };
        match selected_open {
            Some(open) if self.token_visible(&open, current_state) => {}
            _ => return Vec::new(),
        }

        let mut path: VecDeque<i64> = VecDeque::from([-1]);
        if selected.kind == TokenKind::Open {
            path[0] += 1;
            tokens.pop();
        }

        let mut open_num: i64 = 0;
        while let Some(token) = tokens.pop() {
            if !self.token_visible(&token, current_state) {
                match token.kind {
                    // A hidden ancestor.
                    TokenKind::Open if open_num == 0 => return Vec::new(),
                    TokenKind::Open if open_num == -1 => path[0] -= 1,
                    TokenKind::SelfClosing if open_num == 0 => path[0] -= 1,
                    _ => {}
                }
            }
            match token.kind {
                TokenKind::SelfClosing => {
                    if open_num == 0 {
                        path[0] += 1;
                    }
                }
                TokenKind::Open => {
                    open_num += 1;
                    if open_num == 0 {
                        path[0] += 1;
                    } else if open_num > 0 {
                        path.push_front(0);
                        open_num = 0;
                    }
                }
                TokenKind::Close => open_num -= 1,
                _ => {}
            }
        }

        if path.iter().any(|&i| i < 0) {
            return Vec::new();
        }
        path.into_iter().map(|i| i as usize).collect()
    }

    /// The tag at `path` in a parsed tree, counting only visible element
    /// children. The first index addresses the root and is not checked.
    pub fn find_item_by_path<'a>(
        &self,
        root: &'a Tag,
        path: &[usize],
        current_state: Option<&str>,
        all_states: &[&str],
    ) -> Option<&'a Tag> {
        let (_, rest) = path.split_first()?;
        let mut current = root;
        for &index in rest {
            current = current
                .children
                .iter()
                .filter_map(Node::as_tag)
                .filter(|tag| self.is_visible(tag, current_state, all_states))
                .nth(index)?;
        }
        Some(current)
    }
}

/// The open tag matching the close tag at the end of `tokens`.
fn matching_open<'a>(tokens: &[Token<'a>]) -> Option<Token<'a>> {
    let mut depth = 0usize;
    for token in tokens.iter().rev() {
        match token.kind {
            TokenKind::Close => depth += 1,
            TokenKind::Open => {
                depth -= 1;
                if depth == 0 {
                    return Some(*token);
                }
            }
            _ => {}
        }
    }
    None
}
