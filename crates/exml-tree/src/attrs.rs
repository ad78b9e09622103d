//! Attribute spans inside a single start-tag token.
//!
//! The lexer works on the raw text of one tag (`<name a="1" b='2'/>`) and
//! reports byte spans relative to that text. It never unescapes and never
//! fails: it stops at the first thing it cannot read as `name = "value"`.

use crate::position::Span;
use memchr::memchr;

/// One attribute as it appears in a tag's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpan {
    pub name: Span,

    /// Value between the quotes (or the bare value when unquoted).
    pub value: Span,

    /// From the start of the whitespace run before the name through the
    /// closing quote. Removing this span removes the attribute cleanly.
    pub extent: Span,

    /// `b'"'`, `b'\''`, or `0` when unquoted.
    pub quote: u8,
}

impl AttributeSpan {
    pub fn name<'a>(&self, tag_text: &'a str) -> &'a str {
        &tag_text[self.name.start..self.name.end]
    }

    pub fn value<'a>(&self, tag_text: &'a str) -> &'a str {
        &tag_text[self.value.start..self.value.end]
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

fn is_name_end(b: u8) -> bool {
    is_space(b) || matches!(b, b'=' | b'>' | b'/')
}

/// Lex the attributes of a start tag (or self-closing tag).
pub fn tag_attributes(tag_text: &str) -> Vec<AttributeSpan> {
    let bytes = tag_text.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();

    if bytes.first() != Some(&b'<') {
        return spans;
    }
    let mut i = 1;
    while i < len && !is_name_end(bytes[i]) {
        i += 1;
    }

    loop {
        let ws_start = i;
        while i < len && is_space(bytes[i]) {
            i += 1;
        }
        if i >= len || matches!(bytes[i], b'>' | b'/' | b'?') {
            break;
        }

        let name_start = i;
        while i < len && !is_name_end(bytes[i]) {
            i += 1;
        }
        let name = Span::new(name_start, i);
        if name.is_empty() {
            break;
        }

        while i < len && is_space(bytes[i]) {
            i += 1;
        }
        if i >= len || bytes[i] != b'=' {
            // Valueless attribute: not XML, but skip over it.
            continue;
        }
        i += 1;
        while i < len && is_space(bytes[i]) {
            i += 1;
        }
        if i >= len {
            break;
        }

        let quote = bytes[i];
        if quote == b'"' || quote == b'\'' {
            let value_start = i + 1;
            let Some(rel) = memchr(quote, &bytes[value_start..]) else {
                break;
            };
            let value_end = value_start + rel;
            i = value_end + 1;
            spans.push(AttributeSpan {
                name,
                value: Span::new(value_start, value_end),
                extent: Span::new(ws_start, i),
                quote,
            });
        } else {
            let value_start = i;
            while i < len && !is_space(bytes[i]) && bytes[i] != b'>' {
                if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>') {
                    break;
                }
                i += 1;
            }
            spans.push(AttributeSpan {
                name,
                value: Span::new(value_start, i),
                extent: Span::new(ws_start, i),
                quote: 0,
            });
        }
    }

    spans
}
