//! Locating and rewriting attribute values inside a single tag's text.

use crate::scanner::{Token, TokenKind};

/// Byte offsets of one attribute inside a tag's text.
///
/// `attr_start` is where the attribute begins including the blank run in
/// front of it, so `attr_start..value_end + 1` removes the attribute and its
/// closing quote. `value_start..value_end` is the value between the quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueIndex {
    pub attr_start: usize,
    pub value_start: usize,
    pub value_end: usize,
}

impl ValueIndex {
    pub fn value<'a>(&self, tag_text: &'a str) -> &'a str {
        &tag_text[self.value_start..self.value_end]
    }
}

fn is_blank(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\r' | b'\x0c')
}

/// Find the value of attribute `name` in `tag_text`.
///
/// The canonical spellings ` name="` and ` name='` are tried first (double
/// quotes win). Otherwise the tag is scanned again with every blank treated
/// as a space, which accepts `name = "v"`, a tab before the name, and
/// similar hand-written variants. Returns `None` when the attribute is
/// absent or its value has no closing quote.
pub fn get_value_index(tag_text: &str, name: &str) -> Option<ValueIndex> {
    let double = format!(" {}=\"", name);
    let single = format!(" {}='", name);
    let (index, probe, quote) = match tag_text.find(&double) {
        Some(index) => (index, &double, '"'),
        None => match tag_text.find(&single) {
            Some(index) => (index, &single, '\''),
            None => return value_index_relaxed(tag_text, name),
        },
    };

    let bytes = tag_text.as_bytes();
    let mut attr_start = index;
    while attr_start > 0 && is_blank(bytes[attr_start - 1]) {
        attr_start -= 1;
    }
    let value_start = index + probe.len();
    let value_end = value_start + tag_text[value_start..].find(quote)?;
    Some(ValueIndex {
        attr_start,
        value_start,
        value_end,
    })
}

fn value_index_relaxed(tag_text: &str, name: &str) -> Option<ValueIndex> {
    // Blanks are single bytes, so offsets into the normalized copy are
    // offsets into the original.
    let normalized: String = tag_text
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r' | '\x0c') { ' ' } else { c })
        .collect();

    let (attr_start, equals) = match normalized.find(&format!(" {}=", name)) {
        Some(index) => (index, index + name.len() + 1),
        None => {
            let index = normalized.find(&format!(" {} ", name))?;
            (index, index + normalized[index..].find('=')?)
        }
    };

    let after = equals + 1;
    let mut rest = &normalized[after..];
    if let Some(next_equals) = rest.find('=') {
        rest = &rest[..next_equals];
    }
    let quote = if rest.contains('"') { '"' } else { '\'' };
    let open = rest.find(quote)?;
    let close = rest.rfind(quote)?;
    if close <= open {
        return None;
    }
    Some(ValueIndex {
        attr_start,
        value_start: after + open + 1,
        value_end: after + close,
    })
}

/// Entries of a comma-separated state list, trimmed, empty entries dropped.
pub(crate) fn split_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Replace the value at `index`.
pub(crate) fn replace_value(tag_text: &str, index: &ValueIndex, value: &str) -> String {
    format!(
        "{}{}{}",
        &tag_text[..index.value_start],
        value,
        &tag_text[index.value_end..]
    )
}

/// Remove the attribute at `index` along with the blanks before it.
pub(crate) fn remove_attribute(tag_text: &str, index: &ValueIndex) -> String {
    let head = tag_text[..index.attr_start].trim_end();
    let tail = tag_text.get(index.value_end + 1..).unwrap_or("");
    format!("{}{}", head, tail)
}

/// Insert ` name="value"` after the last attribute of an element token.
pub(crate) fn insert_attribute(tag_text: &str, kind: TokenKind, name: &str, value: &str) -> String {
    insert_raw(tag_text, kind, &format!(" {}=\"{}\"", name, value))
}

/// Insert `raw` (which should start with a blank) after the last attribute
/// of an element token.
pub(crate) fn insert_raw(tag_text: &str, kind: TokenKind, raw: &str) -> String {
    let token = Token {
        kind,
        span: exml_tree::Span::new(0, tag_text.len()),
        text: tag_text,
    };
    let at = token.insertion_point();
    format!("{}{}{}", &tag_text[..at], raw, &tag_text[at..])
}
