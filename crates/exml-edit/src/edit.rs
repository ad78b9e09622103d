//! Edit results and the splice buffer transforms write through.

use exml_tree::Span;

/// Output of a text transform.
///
/// `fully_succeeded` is `false` when the scan stopped early on malformed
/// input; the part of the document after that point is in `text` unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub text: String,
    pub fully_succeeded: bool,
}

impl EditResult {
    pub fn new(text: String, fully_succeeded: bool) -> Self {
        Self {
            text,
            fully_succeeded,
        }
    }

    /// The input returned as is.
    pub fn unchanged(text: &str, fully_succeeded: bool) -> Self {
        Self::new(text.to_string(), fully_succeeded)
    }

    /// Apply a further transform, combining both success flags.
    pub fn and_then(self, next: impl FnOnce(&str) -> EditResult) -> EditResult {
        let result = next(&self.text);
        EditResult {
            text: result.text,
            fully_succeeded: self.fully_succeeded && result.fully_succeeded,
        }
    }
}

/// Copies a source string into a new buffer, replacing or dropping spans.
///
/// Spans must be handed over in increasing, non-overlapping order.
pub(crate) struct Rewriter<'a> {
    source: &'a str,
    out: String,
    cursor: usize,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            out: String::with_capacity(source.len()),
            cursor: 0,
        }
    }

    /// Copy the source up to `offset`.
    pub(crate) fn keep_until(&mut self, offset: usize) {
        if offset > self.cursor {
            self.out.push_str(&self.source[self.cursor..offset]);
            self.cursor = offset;
        }
    }

    /// Copy up to `span`, then write `replacement` in its place.
    pub(crate) fn replace(&mut self, span: Span, replacement: &str) {
        self.keep_until(span.start);
        self.out.push_str(replacement);
        self.cursor = span.end;
    }

    /// Copy up to `span`, then drop it together with the blank run written
    /// just before it.
    pub(crate) fn remove(&mut self, span: Span) {
        self.keep_until(span.start);
        let kept = self.out.trim_end().len();
        self.out.truncate(kept);
        self.cursor = span.end;
    }

    /// Text written so far.
    pub(crate) fn output(&self) -> &str {
        &self.out
    }

    /// Append whatever is left of the source.
    pub(crate) fn finish(mut self, fully_succeeded: bool) -> EditResult {
        let end = self.source.len();
        self.keep_until(end);
        EditResult::new(self.out, fully_succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewriter_replace_and_remove() {
        let source = "<a>\n\t<b/>\n\t<c/>\n</a>";
        let mut rewriter = Rewriter::new(source);
        rewriter.remove(Span::new(5, 9));
        rewriter.replace(Span::new(11, 15), "<d/>");
        assert_eq!(rewriter.finish(true).text, "<a>\n\t<d/>\n</a>");
    }

    #[test]
    fn test_and_then_combines_flags() {
        let result = EditResult::unchanged("a", false).and_then(|t| EditResult::new(format!("{t}b"), true));
        assert_eq!(result, EditResult::new("ab".to_string(), false));
    }
}
