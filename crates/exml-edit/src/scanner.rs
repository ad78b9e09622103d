//! Tag-boundary scanner shared by every text transform.
//!
//! The scanner walks raw text from one `<…>` token to the next without
//! building a tree, so it keeps working on documents that do not parse.
//! Comments, CDATA sections, processing instructions and `<!…>`
//! declarations come back as inert tokens. Inside an element token a `>`
//! within a quoted attribute value does not end the token; a quote preceded
//! by a backslash neither opens nor closes a value.

use exml_tree::Span;
use memchr::{memchr, memchr3, memmem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name …>`
    Open,
    /// `</name>`
    Close,
    /// `<name …/>`
    SelfClosing,
    /// `<!-- … -->`
    Comment,
    /// `<![CDATA[ … ]]>`
    CData,
    /// `<? … ?>`
    Instruction,
    /// `<!DOCTYPE …>` and other `<!…>` markup.
    Declaration,
}

/// One `<…>` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// Open, close or self-closing element token.
    pub fn is_element(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Open | TokenKind::Close | TokenKind::SelfClosing
        )
    }

    /// Open or self-closing: a token that starts an element.
    pub fn is_start(&self) -> bool {
        matches!(self.kind, TokenKind::Open | TokenKind::SelfClosing)
    }

    /// Qualified element name, empty for inert tokens.
    pub fn name(&self) -> &'a str {
        if !self.is_element() {
            return "";
        }
        let skip = if self.kind == TokenKind::Close { 2 } else { 1 };
        let rest = self.text.get(skip..).unwrap_or("");
        let end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        &rest[..end]
    }

    pub fn prefix(&self) -> Option<&'a str> {
        self.name().split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn local_name(&self) -> &'a str {
        let name = self.name();
        name.split_once(':').map_or(name, |(_, local)| local)
    }

    /// Offset within `text` at which a new attribute should be inserted:
    /// right after the last non-blank character before `>` or `/>`.
    pub fn insertion_point(&self) -> usize {
        let closer = match self.kind {
            TokenKind::SelfClosing => 2,
            _ => 1,
        };
        let head = &self.text[..self.text.len().saturating_sub(closer)];
        head.trim_end().len()
    }
}

/// Iterator over the tokens of a document.
///
/// Text between tokens is not reported; callers recover it from the spans.
/// Iteration stops at the end of input, at a token whose terminator is
/// missing, or at a close tag with nothing open. The latter two are
/// recorded as a failure.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    depth: usize,
    failure: Option<usize>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            depth: 0,
            failure: None,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// End of the last token returned.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of elements opened and not yet closed.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Offset of the token the scan stopped at, if it stopped on malformed
    /// input.
    pub fn failure(&self) -> Option<usize> {
        self.failure
    }

    /// No malformed token was met and every element opened so far has been
    /// closed.
    pub fn is_clean(&self) -> bool {
        self.failure.is_none() && self.depth == 0
    }

    /// Consume tokens up to the close tag matching `open`, returning the end
    /// offset of that close tag. A self-closing `open` is its own end.
    pub fn skip_subtree(&mut self, open: &Token<'_>) -> Option<usize> {
        if open.kind != TokenKind::Open {
            return Some(open.span.end);
        }
        let target = self.depth.saturating_sub(1);
        while let Some(token) = self.next() {
            if token.kind == TokenKind::Close && self.depth == target {
                return Some(token.span.end);
            }
        }
        None
    }

    fn fail(&mut self, at: usize) -> Option<Token<'a>> {
        tracing::debug!(offset = at, "scan stopped on malformed input");
        self.failure = Some(at);
        self.pos = self.source.len();
        None
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.failure.is_some() || self.pos >= self.source.len() {
            return None;
        }
        let bytes = self.source.as_bytes();
        let start = self.pos + memchr(b'<', &bytes[self.pos..])?;
        let rest = &bytes[start..];

        let found = if rest.starts_with(b"<!--") {
            find_after(bytes, start + 4, b"-->").map(|end| (TokenKind::Comment, end))
        } else if rest.starts_with(b"<![CDATA[") {
            find_after(bytes, start + 9, b"]]>").map(|end| (TokenKind::CData, end))
        } else if rest.starts_with(b"<?") {
            find_after(bytes, start + 2, b"?>").map(|end| (TokenKind::Instruction, end))
        } else if rest.starts_with(b"<!") {
            find_after(bytes, start + 2, b">").map(|end| (TokenKind::Declaration, end))
        } else {
            element_end(bytes, start + 1).map(|end| (classify(&bytes[start..end]), end))
        };

        let Some((kind, end)) = found else {
            return self.fail(start);
        };

        match kind {
            TokenKind::Open => self.depth += 1,
            TokenKind::Close => {
                if self.depth == 0 {
                    return self.fail(start);
                }
                self.depth -= 1;
            }
            _ => {}
        }

        self.pos = end;
        Some(Token {
            kind,
            span: Span::new(start, end),
            text: &self.source[start..end],
        })
    }
}

/// End offset (exclusive) of the first `needle` at or after `from`.
fn find_after(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    let tail = bytes.get(from..)?;
    memmem::find(tail, needle).map(|i| from + i + needle.len())
}

/// End offset (exclusive) of the element token whose body starts at `from`.
fn element_end(bytes: &[u8], from: usize) -> Option<usize> {
    let escaped = |i: usize| i > 0 && bytes[i - 1] == b'\\';
    let mut i = from;
    let mut quote: Option<u8> = None;
    loop {
        match quote {
            None => {
                let j = i + memchr3(b'>', b'"', b'\'', bytes.get(i..)?)?;
                i = j + 1;
                match bytes[j] {
                    b'>' => return Some(i),
                    q if !escaped(j) => quote = Some(q),
                    _ => {}
                }
            }
            Some(q) => {
                let j = i + memchr(q, bytes.get(i..)?)?;
                i = j + 1;
                if !escaped(j) {
                    quote = None;
                }
            }
        }
    }
}

fn classify(token: &[u8]) -> TokenKind {
    if token.starts_with(b"</") {
        TokenKind::Close
    } else if token.ends_with(b"/>") {
        TokenKind::SelfClosing
    } else {
        TokenKind::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, &str)> {
        Scanner::new(source).map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_scan_element_kinds() {
        let tokens = kinds(r#"<a x="1"><b/>text</a>"#);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Open, r#"<a x="1">"#),
                (TokenKind::SelfClosing, "<b/>"),
                (TokenKind::Close, "</a>"),
            ]
        );
    }

    #[test]
    fn test_scan_inert_tokens() {
        let source = "<?xml version=\"1.0\"?><!DOCTYPE a><a><!-- <b> --><![CDATA[<c>]]></a>";
        let tokens = kinds(source);
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Instruction,
                TokenKind::Declaration,
                TokenKind::Open,
                TokenKind::Comment,
                TokenKind::CData,
                TokenKind::Close,
            ]
        );
        assert_eq!(tokens[3].1, "<!-- <b> -->");
        assert_eq!(tokens[4].1, "<![CDATA[<c>]]>");
    }

    #[test]
    fn test_gt_inside_quotes() {
        let tokens = kinds(r#"<a label="x > y" tip='>'/>"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].0, TokenKind::SelfClosing);
    }

    #[test]
    fn test_escaped_quote_does_not_close_value() {
        let source = r#"<a label="say \"hi\" >" b="2"/>"#;
        let tokens = kinds(source);
        assert_eq!(tokens, vec![(TokenKind::SelfClosing, source)]);
    }

    #[test]
    fn test_names() {
        let mut scanner = Scanner::new(r#"<e:Group id="g"></e:Group>"#);
        let open = scanner.next().unwrap();
        assert_eq!(open.name(), "e:Group");
        assert_eq!(open.prefix(), Some("e"));
        assert_eq!(open.local_name(), "Group");
        let close = scanner.next().unwrap();
        assert_eq!(close.name(), "e:Group");
        assert!(scanner.is_clean());
    }

    #[test]
    fn test_insertion_point() {
        let mut scanner = Scanner::new(r#"<a x="1" /><b>"#);
        let a = scanner.next().unwrap();
        assert_eq!(&a.text[..a.insertion_point()], r#"<a x="1""#);
        let b = scanner.next().unwrap();
        assert_eq!(b.insertion_point(), 2);
    }

    #[test]
    fn test_unterminated_token_fails() {
        let mut scanner = Scanner::new(r#"<a><b x="1></a>"#);
        assert_eq!(scanner.next().map(|t| t.kind), Some(TokenKind::Open));
        assert!(scanner.next().is_none());
        assert_eq!(scanner.failure(), Some(3));
        assert!(!scanner.is_clean());
    }

    #[test]
    fn test_stray_close_fails() {
        let mut scanner = Scanner::new("<a/></b><c/>");
        assert!(scanner.next().is_some());
        assert!(scanner.next().is_none());
        assert_eq!(scanner.failure(), Some(4));
    }

    #[test]
    fn test_unbalanced_is_not_clean() {
        let mut scanner = Scanner::new("<a><b/>");
        assert_eq!(scanner.by_ref().count(), 2);
        assert_eq!(scanner.failure(), None);
        assert_eq!(scanner.depth(), 1);
        assert!(!scanner.is_clean());
    }

    #[test]
    fn test_skip_subtree() {
        let source = "<a><b><b/><c></c></b><d/></a>";
        let mut scanner = Scanner::new(source);
        scanner.next();
        let b = scanner.next().unwrap();
        let end = scanner.skip_subtree(&b).unwrap();
        assert_eq!(&source[b.span.start..end], "<b><b/><c></c></b>");
        assert_eq!(scanner.next().map(|t| t.text), Some("<d/>"));
    }
}
