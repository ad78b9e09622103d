//! Re-indenting a range of a document from its tag nesting.

use crate::edit::EditResult;
use crate::editor::StateEditor;
use crate::scanner::{Scanner, TokenKind};

impl StateEditor {
    /// Rewrite the indentation of every line in `start..end`.
    ///
    /// Each tag is indented one level deeper than the element it sits in.
    /// Elements opened before `start` set the starting level from the
    /// indentation they already have. Text outside the range is copied
    /// unchanged; a token that straddles `start` is formatted, one that
    /// straddles `end` is the last one formatted.
    pub fn format_indent(&self, text: &str, start: usize, end: usize) -> EditResult {
        let mut scanner = Scanner::new(text);
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        let mut indent = 0usize;
        // Elements opened before `start` and still open, by offset. Taken
        // once formatting begins.
        let mut open_before: Option<Vec<usize>> = Some(Vec::new());

        while let Some(token) = scanner.next() {
            let gap = &text[cursor..token.span.start];
            if token.span.start >= start {
                out.push_str(&self.replace_indent(gap, indent, true, true));
            } else {
                out.push_str(gap);
            }
            cursor = token.span.start;
            if token.span.start >= end {
                break;
            }
            let contains_break = out.ends_with(['\n', '\r']);

            if token.span.end >= start {
                if let Some(open) = open_before.take() {
                    if let Some(&enclosing) = open.last() {
                        indent = self.indent_at(&out, enclosing) + 1;
                    }
                }
                if token.kind == TokenKind::Close {
                    indent = indent.saturating_sub(1);
                }
                out.push_str(&self.replace_indent(token.text, indent, !contains_break, false));
                if token.kind == TokenKind::Open {
                    indent += 1;
                }
            } else {
                if let Some(open) = open_before.as_mut() {
                    match token.kind {
                        TokenKind::Open => open.push(token.span.start),
                        TokenKind::Close => {
                            open.pop();
                        }
                        _ => {}
                    }
                }
                out.push_str(token.text);
            }
            cursor = token.span.end;
            if token.span.end >= end {
                break;
            }
        }

        out.push_str(&text[cursor..]);
        EditResult::new(out, scanner.failure().is_none())
    }

    /// Indentation level of the blank run ending at byte `index`: one per
    /// tab plus one per started group of `spaces_per_level` spaces.
    pub fn indent_at(&self, text: &str, index: usize) -> usize {
        let head = &text.as_bytes()[..index.min(text.len())];
        let mut tabs = 0;
        let mut spaces: usize = 0;
        for &b in head.iter().rev() {
            match b {
                b'\t' => tabs += 1,
                b' ' => spaces += 1,
                _ => break,
            }
        }
        tabs + spaces.div_ceil(self.indent.spaces_per_level)
    }

    /// [`StateEditor::indent_at`] written out in the configured unit.
    pub fn indent_string_at(&self, text: &str, index: usize) -> String {
        self.indent.unit.repeat(self.indent_at(text, index))
    }

    /// Re-indent every line of `text` to `indent` levels. Line breaks are
    /// normalized to `\n`; blank lines are left empty.
    fn replace_indent(&self, text: &str, indent: usize, skip_first: bool, skip_last: bool) -> String {
        let prefix = self.indent.unit.repeat(indent);
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = normalized.split('\n').collect();
        let last = lines.len() - 1;

        let mut out = String::with_capacity(text.len() + prefix.len() * lines.len());
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if i == 0 && skip_first {
                out.push_str(line);
                continue;
            }
            let mut line = line.trim_start();
            if i == last && i > 0 && skip_last {
                line = line.trim_end();
            }
            if !line.is_empty() {
                out.push_str(&prefix);
                out.push_str(line);
            }
        }
        out
    }
}
